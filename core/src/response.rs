//! Response — the result of executing one `Command`.

use serde::{Deserialize, Serialize};


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response {
    Ok { output: String },
    Error { message: String },
}


impl Response {
    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok { .. })
    }
}


impl<E: std::fmt::Display> From<Result<String, E>> for Response {
    fn from(result: Result<String, E>) -> Self {
        match result {
            Ok(output) => Response::Ok { output },
            Err(e) => Response::Error {
                message: e.to_string(),
            },
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_by_status() {
        let json = serde_json::to_string(&Response::Ok { output: "3".into() }).unwrap();
        assert_eq!(json, r#"{"status":"ok","output":"3"}"#);
        let back: Response = serde_json::from_str(r#"{"status":"error","message":"x"}"#).unwrap();
        assert_eq!(back, Response::Error { message: "x".into() });
    }

    #[test]
    fn from_result() {
        let ok: Response = Ok::<_, String>("done".to_string()).into();
        assert!(ok.is_ok());
        let err: Response = Err::<String, _>("bad").into();
        assert_eq!(err, Response::Error { message: "bad".into() });
    }
}
