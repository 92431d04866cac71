use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Telnet command bytes we care about (RFC 854).
pub const IAC: u8 = 255;
pub const WILL: u8 = 251;
pub const WONT: u8 = 252;
pub const DO: u8 = 253;
pub const DONT: u8 = 254;
pub const SB: u8 = 250;
pub const SE: u8 = 240;

pub const OPT_ECHO: u8 = 1;
pub const OPT_SUPPRESS_GO_AHEAD: u8 = 3;
pub const OPT_LINEMODE: u8 = 34;

const BACKSPACE: u8 = 0x08;
const DEL: u8 = 0x7f;

/// The negotiation lines the server asserts on connect: WILL
/// SUPPRESS_GO_AHEAD, WONT ECHO, DONT LINEMODE.
pub fn initial_negotiation() -> Vec<u8> {
    vec![
        IAC, WILL, OPT_SUPPRESS_GO_AHEAD,
        IAC, WONT, OPT_ECHO,
        IAC, DONT, OPT_LINEMODE,
    ]
}

pub fn will_echo() -> Vec<u8> {
    vec![IAC, WILL, OPT_ECHO]
}

pub fn wont_echo() -> Vec<u8> {
    vec![IAC, WONT, OPT_ECHO]
}

/// A line codec over the raw telnet byte stream: strips IAC negotiation and
/// subnegotiation sequences from the input, applies backspace/DEL editing
/// to the pending line, and splits completed lines on CR, LF, or CRLF
///. Output lines are written verbatim plus a
/// trailing CRLF; ANSI SGR sequences the caller embeds pass through
/// untouched.
#[derive(Default)]
pub struct TelnetCodec {
    /// Bytes of the current line, after IAC/backspace processing, not yet
    /// terminated.
    pending: Vec<u8>,
    /// `true` if we're mid-IAC-sequence and need more bytes to finish it.
    in_subnegotiation: bool,
}

impl TelnetCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for TelnetCodec {
    type Item = String;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            if src.is_empty() {
                return Ok(None);
            }
            let byte = src[0];

            if self.in_subnegotiation {
                src.advance(1);
                if byte == SE && self.pending.last() == Some(&IAC) {
                    self.in_subnegotiation = false;
                    self.pending.pop();
                }
                continue;
            }

            match byte {
                IAC => {
                    if src.len() < 2 {
                        return Ok(None);
                    }
                    let cmd = src[1];
                    match cmd {
                        WILL | WONT | DO | DONT => {
                            if src.len() < 3 {
                                return Ok(None);
                            }
                            src.advance(3);
                        }
                        SB => {
                            self.in_subnegotiation = true;
                            self.pending.push(IAC);
                            src.advance(2);
                        }
                        IAC => {
                            // Escaped 0xFF data byte.
                            self.pending.push(IAC);
                            src.advance(2);
                        }
                        _ => {
                            src.advance(2);
                        }
                    }
                }
                b'\r' => {
                    src.advance(1);
                    if !src.is_empty() && src[0] == b'\n' {
                        src.advance(1);
                    }
                    let line = String::from_utf8_lossy(&self.pending).into_owned();
                    self.pending.clear();
                    return Ok(Some(line));
                }
                b'\n' => {
                    src.advance(1);
                    let line = String::from_utf8_lossy(&self.pending).into_owned();
                    self.pending.clear();
                    return Ok(Some(line));
                }
                BACKSPACE | DEL => {
                    src.advance(1);
                    self.pending.pop();
                }
                _ => {
                    src.advance(1);
                    self.pending.push(byte);
                }
            }
        }
    }
}

impl Encoder<String> for TelnetCodec {
    type Error = std::io::Error;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(item.as_bytes());
        dst.extend_from_slice(b"\r\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_negotiation_and_splits_on_crlf() {
        let mut codec = TelnetCodec::new();
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&[IAC, WILL, OPT_ECHO]);
        buf.extend_from_slice(b"look\r\n");
        let line = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(line, "look");
    }

    #[test]
    fn backspace_trims_last_byte() {
        let mut codec = TelnetCodec::new();
        let mut buf = BytesMut::new();
        buf.extend_from_slice(b"loox");
        buf.push(BACKSPACE);
        buf.extend_from_slice(b"k\n");
        let line = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(line, "look");
    }

    #[test]
    fn bare_lf_also_terminates_a_line() {
        let mut codec = TelnetCodec::new();
        let mut buf = BytesMut::new();
        buf.extend_from_slice(b"north\n");
        let line = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(line, "north");
    }

    #[test]
    fn subnegotiation_block_is_dropped_entirely() {
        let mut codec = TelnetCodec::new();
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&[IAC, SB, 24, 0, IAC, SE]);
        buf.extend_from_slice(b"who\r\n");
        let line = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(line, "who");
    }
}
