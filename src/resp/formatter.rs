//! Formats the five RESP reply kinds.

use crate::error::PicoError;

/// A reply value ready to be written to a session's socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(String),
    NullBulk,
    Array(Vec<Reply>),
    NullArray,
}

impl Reply {
    pub fn ok() -> Reply {
        Reply::Simple("OK".to_string())
    }

    pub fn queued() -> Reply {
        Reply::Simple("QUEUED".to_string())
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Reply::Simple(s) => {
                out.push(b'+');
                out.extend_from_slice(s.as_bytes());
                out.extend_from_slice(b"\r\n");
            }
            Reply::Error(s) => {
                out.push(b'-');
                out.extend_from_slice(s.as_bytes());
                out.extend_from_slice(b"\r\n");
            }
            Reply::Integer(n) => {
                out.push(b':');
                out.extend_from_slice(n.to_string().as_bytes());
                out.extend_from_slice(b"\r\n");
            }
            Reply::Bulk(s) => {
                out.push(b'$');
                out.extend_from_slice(s.len().to_string().as_bytes());
                out.extend_from_slice(b"\r\n");
                out.extend_from_slice(s.as_bytes());
                out.extend_from_slice(b"\r\n");
            }
            Reply::NullBulk => out.extend_from_slice(b"$-1\r\n"),
            Reply::NullArray => out.extend_from_slice(b"*-1\r\n"),
            Reply::Array(items) => {
                out.push(b'*');
                out.extend_from_slice(items.len().to_string().as_bytes());
                out.extend_from_slice(b"\r\n");
                for item in items {
                    item.encode_into(out);
                }
            }
        }
    }
}

impl From<&PicoError> for Reply {
    fn from(err: &PicoError) -> Self {
        Reply::Error(err.to_string())
    }
}

impl From<PicoError> for Reply {
    fn from(err: PicoError) -> Self {
        Reply::Error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_string() {
        assert_eq!(Reply::ok().encode(), b"+OK\r\n");
    }

    #[test]
    fn error_reply() {
        assert_eq!(
            Reply::Error("ERR boom".into()).encode(),
            b"-ERR boom\r\n"
        );
    }

    #[test]
    fn integer_reply() {
        assert_eq!(Reply::Integer(42).encode(), b":42\r\n");
        assert_eq!(Reply::Integer(-1).encode(), b":-1\r\n");
    }

    #[test]
    fn bulk_and_null_bulk() {
        assert_eq!(Reply::Bulk("bar".into()).encode(), b"$3\r\nbar\r\n");
        assert_eq!(Reply::NullBulk.encode(), b"$-1\r\n");
    }

    #[test]
    fn array_of_mixed_replies() {
        let reply = Reply::Array(vec![Reply::ok(), Reply::Integer(2)]);
        assert_eq!(reply.encode(), b"*2\r\n+OK\r\n:2\r\n");
    }

    #[test]
    fn error_from_pico_error() {
        let reply: Reply = PicoError::NotInteger.into();
        assert_eq!(
            reply.encode(),
            b"-ERR value is not an integer or out of range\r\n"
        );
    }
}
