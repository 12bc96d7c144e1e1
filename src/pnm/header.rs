//! PNM header parsing for P5, P6 and P7.

use super::{PnmFormat, PnmHeader};
use crate::error::RegionError;

const NAME: &str = "PNM";

fn invalid(reason: impl Into<String>) -> RegionError {
    RegionError::index(NAME, reason)
}

struct HeaderReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> HeaderReader<'a> {
    fn skip_whitespace_and_comments(&mut self) {
        while let Some(&b) = self.data.get(self.pos) {
            if b == b'#' {
                while let Some(&c) = self.data.get(self.pos) {
                    self.pos += 1;
                    if c == b'\n' || c == b'\r' {
                        break;
                    }
                }
            } else if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn token(&mut self) -> Result<&'a [u8], RegionError> {
        self.skip_whitespace_and_comments();
        let start = self.pos;
        while self
            .data
            .get(self.pos)
            .is_some_and(|b| !b.is_ascii_whitespace() && *b != b'#')
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(invalid("unexpected end of header"));
        }
        Ok(&self.data[start..self.pos])
    }

    fn number(&mut self, what: &str) -> Result<u32, RegionError> {
        let tok = self.token()?;
        parse_u32(tok).ok_or_else(|| {
            invalid(format!("{what} is not a number: {:?}", String::from_utf8_lossy(tok)))
        })
    }

    /// Next header line without its terminator, or `None` at end of data.
    fn line(&mut self) -> Option<&'a [u8]> {
        if self.pos >= self.data.len() {
            return None;
        }
        let rest = &self.data[self.pos..];
        let len = rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len());
        self.pos += (len + 1).min(rest.len());
        Some(&rest[..len])
    }
}

fn parse_u32(tok: &[u8]) -> Option<u32> {
    core::str::from_utf8(tok).ok()?.parse().ok()
}

/// Parse the header and locate the first pixel row.
pub(crate) fn parse_header(data: &[u8]) -> Result<PnmHeader, RegionError> {
    let format = match data.get(..2) {
        Some(b"P5") => PnmFormat::Pgm,
        Some(b"P6") => PnmFormat::Ppm,
        Some(b"P7") => PnmFormat::Pam,
        _ => return Err(invalid("unrecognized PNM magic")),
    };
    let mut reader = HeaderReader { data, pos: 2 };

    let header = match format {
        PnmFormat::Pgm | PnmFormat::Ppm => {
            let width = reader.number("width")?;
            let height = reader.number("height")?;
            let maxval = reader.number("maxval")?;
            // Exactly one whitespace byte separates the header from the raster.
            match data.get(reader.pos) {
                Some(b) if b.is_ascii_whitespace() => reader.pos += 1,
                _ => return Err(invalid("missing whitespace after maxval")),
            }
            PnmHeader {
                format,
                width,
                height,
                maxval,
                depth: if format == PnmFormat::Pgm { 1 } else { 3 },
                data_offset: reader.pos,
            }
        }
        PnmFormat::Pam => parse_pam(&mut reader)?,
    };

    if header.width == 0 || header.height == 0 {
        return Err(invalid(format!(
            "zero dimension {}x{}",
            header.width, header.height
        )));
    }
    if header.maxval == 0 || header.maxval > 65535 {
        return Err(invalid(format!("maxval {} out of range", header.maxval)));
    }
    if !(1..=4).contains(&header.depth) {
        return Err(invalid(format!("unsupported depth {}", header.depth)));
    }
    Ok(header)
}

fn parse_pam(reader: &mut HeaderReader<'_>) -> Result<PnmHeader, RegionError> {
    let (mut width, mut height, mut depth, mut maxval) = (None, None, None, None);
    let mut tupltype: Option<String> = None;

    loop {
        let line = reader
            .line()
            .ok_or_else(|| invalid("PAM header missing ENDHDR"))?;
        let line = line.trim_ascii();
        if line.is_empty() || line.starts_with(b"#") {
            continue;
        }
        if line == b"ENDHDR" {
            break;
        }
        let mut parts = line.splitn(2, |b| b.is_ascii_whitespace());
        let key = parts.next().unwrap_or_default();
        let value = parts.next().unwrap_or_default().trim_ascii();
        let number = || {
            parse_u32(value).ok_or_else(|| {
                invalid(format!(
                    "bad PAM value for {}",
                    String::from_utf8_lossy(key)
                ))
            })
        };
        match key {
            b"WIDTH" => width = Some(number()?),
            b"HEIGHT" => height = Some(number()?),
            b"DEPTH" => depth = Some(number()?),
            b"MAXVAL" => maxval = Some(number()?),
            b"TUPLTYPE" => tupltype = Some(String::from_utf8_lossy(value).into_owned()),
            _ => {}
        }
    }

    let depth = depth.ok_or_else(|| invalid("PAM header missing DEPTH"))?;
    if let Some(tuple) = &tupltype {
        let expected = match tuple.as_str() {
            "BLACKANDWHITE" | "GRAYSCALE" => Some(1),
            "GRAYSCALE_ALPHA" | "BLACKANDWHITE_ALPHA" => Some(2),
            "RGB" => Some(3),
            "RGB_ALPHA" => Some(4),
            _ => None,
        };
        if expected.is_some_and(|d| d != depth) {
            return Err(invalid(format!("TUPLTYPE {tuple} does not match DEPTH {depth}")));
        }
    }

    Ok(PnmHeader {
        format: PnmFormat::Pam,
        width: width.ok_or_else(|| invalid("PAM header missing WIDTH"))?,
        height: height.ok_or_else(|| invalid("PAM header missing HEIGHT"))?,
        maxval: maxval.ok_or_else(|| invalid("PAM header missing MAXVAL"))?,
        depth,
        data_offset: reader.pos,
    })
}
