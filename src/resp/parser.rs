//! Parses the inline Array-of-Bulk-Strings form: a top-level `*N\r\n`
//! followed by `N` Bulk Strings (`$L\r\n<L bytes>\r\n`). Tolerant of
//! partial/streaming input — callers buffer and re-invoke until a
//! complete top-level Array has arrived, draining one request per call so
//! a single read may yield several pipelined requests (spec.md §4.5).

/// Result of attempting to parse one top-level request out of a buffer.
pub enum ParseOutcome {
    /// A full request was parsed; `args[0]` is the command name.
    /// `consumed` bytes should be dropped from the front of the buffer.
    Complete { args: Vec<Vec<u8>>, consumed: usize },
    /// Not enough bytes yet; caller should read more and retry.
    Incomplete,
    /// The input is not a well-formed Array-of-Bulk-Strings request.
    Invalid,
}

fn find_crlf(buf: &[u8], from: usize) -> Option<usize> {
    buf[from..]
        .windows(2)
        .position(|w| w == b"\r\n")
        .map(|p| from + p)
}

/// Reads one CRLF-terminated line starting at `pos`. Returns the line
/// (sans CRLF) and the position just past the CRLF, or `None` if the
/// buffer doesn't yet contain a full line.
fn read_line(buf: &[u8], pos: usize) -> Option<(&[u8], usize)> {
    let end = find_crlf(buf, pos)?;
    Some((&buf[pos..end], end + 2))
}

pub fn parse_request(buf: &[u8]) -> ParseOutcome {
    if buf.is_empty() {
        return ParseOutcome::Incomplete;
    }
    if buf[0] != b'*' {
        return ParseOutcome::Invalid;
    }

    let Some((count_line, mut pos)) = read_line(buf, 1) else {
        return ParseOutcome::Incomplete;
    };
    let Ok(count_str) = std::str::from_utf8(count_line) else {
        return ParseOutcome::Invalid;
    };
    let Ok(count) = count_str.parse::<i64>() else {
        return ParseOutcome::Invalid;
    };
    if count < 0 {
        return ParseOutcome::Invalid;
    }

    let mut args = Vec::with_capacity(count as usize);
    for _ in 0..count {
        if pos >= buf.len() {
            return ParseOutcome::Incomplete;
        }
        if buf[pos] != b'$' {
            return ParseOutcome::Invalid;
        }
        let Some((len_line, next_pos)) = read_line(buf, pos + 1) else {
            return ParseOutcome::Incomplete;
        };
        let Ok(len_str) = std::str::from_utf8(len_line) else {
            return ParseOutcome::Invalid;
        };
        let Ok(len) = len_str.parse::<i64>() else {
            return ParseOutcome::Invalid;
        };
        if len < 0 {
            return ParseOutcome::Invalid;
        }
        let len = len as usize;
        pos = next_pos;

        if pos + len + 2 > buf.len() {
            return ParseOutcome::Incomplete;
        }
        let bytes = buf[pos..pos + len].to_vec();
        if &buf[pos + len..pos + len + 2] != b"\r\n" {
            return ParseOutcome::Invalid;
        }
        args.push(bytes);
        pos += len + 2;
    }

    ParseOutcome::Complete {
        args,
        consumed: pos,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(parts: &[&str]) -> Vec<u8> {
        let mut out = format!("*{}\r\n", parts.len()).into_bytes();
        for p in parts {
            out.extend_from_slice(format!("${}\r\n", p.len()).as_bytes());
            out.extend_from_slice(p.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        out
    }

    #[test]
    fn parses_a_complete_array() {
        let buf = encode(&["SET", "foo", "bar"]);
        match parse_request(&buf) {
            ParseOutcome::Complete { args, consumed } => {
                assert_eq!(consumed, buf.len());
                assert_eq!(args, vec![b"SET".to_vec(), b"foo".to_vec(), b"bar".to_vec()]);
            }
            _ => panic!("expected Complete"),
        }
    }

    #[test]
    fn reports_incomplete_on_partial_input() {
        let buf = encode(&["GET", "foo"]);
        for cut in 1..buf.len() {
            match parse_request(&buf[..cut]) {
                ParseOutcome::Incomplete => {}
                ParseOutcome::Complete { .. } => panic!("should not be complete at cut {cut}"),
                ParseOutcome::Invalid => panic!("should not be invalid at cut {cut}"),
            }
        }
    }

    #[test]
    fn rejects_non_array_input() {
        match parse_request(b"GET foo\r\n") {
            ParseOutcome::Invalid => {}
            _ => panic!("expected Invalid"),
        }
    }

    #[test]
    fn drains_multiple_pipelined_requests() {
        let mut buf = encode(&["SET", "a", "1"]);
        buf.extend_from_slice(&encode(&["GET", "a"]));

        let first = match parse_request(&buf) {
            ParseOutcome::Complete { args, consumed } => {
                assert_eq!(args[0], b"SET");
                consumed
            }
            _ => panic!("expected Complete"),
        };
        match parse_request(&buf[first..]) {
            ParseOutcome::Complete { args, .. } => assert_eq!(args[0], b"GET"),
            _ => panic!("expected Complete for second request"),
        }
    }
}
