/// Failures of a single generation attempt. None of them are retried; the
/// caller discards any partial graph and shows the message instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("missing input: {what}")]
    MissingInput { what: &'static str },

    #[error("concept service request failed{}: {message}", status_suffix(.status))]
    ServiceRequest { status: Option<u16>, message: String },

    #[error("malformed concept map response: {reason}")]
    MalformedResponse { reason: String },

    #[error("topic `{name}` names parent `{parent}`, which is not in the map")]
    UnresolvedParent { name: String, parent: String },

    #[error("topic `{name}` appears more than once")]
    DuplicateTopic { name: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Error::MalformedResponse {
            reason: reason.into(),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {code})"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_error_mentions_status() {
        let err = Error::ServiceRequest {
            status: Some(403),
            message: "forbidden".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "concept service request failed (HTTP 403): forbidden"
        );
    }

    #[test]
    fn transport_error_has_no_status() {
        let err = Error::ServiceRequest {
            status: None,
            message: "connection reset".to_string(),
        };
        assert!(!err.to_string().contains("HTTP"));
    }
}
