use crate::types::{HsResult, HypersegError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// On-disk band ordering of a multi-band raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interleave {
    /// Band-interleaved-by-line: per line, all samples of band 0, then band 1, ...
    Bil,
    /// Band-interleaved-by-pixel
    Bip,
    /// Band-sequential
    Bsq,
}

impl Interleave {
    fn from_keyword(s: &str) -> HsResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "bil" => Ok(Interleave::Bil),
            "bip" => Ok(Interleave::Bip),
            "bsq" => Ok(Interleave::Bsq),
            other => Err(HypersegError::InvalidHeader(format!(
                "Unknown interleave keyword '{}'",
                other
            ))),
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Interleave::Bil => "bil",
            Interleave::Bip => "bip",
            Interleave::Bsq => "bsq",
        }
    }
}

impl std::fmt::Display for Interleave {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

/// Floating-point ENVI cell types supported by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnviDataType {
    /// ENVI code 4
    Float32,
    /// ENVI code 5
    Float64,
}

impl EnviDataType {
    pub fn from_code(code: u32) -> HsResult<Self> {
        match code {
            4 => Ok(EnviDataType::Float32),
            5 => Ok(EnviDataType::Float64),
            other => Err(HypersegError::UnsupportedLayout(format!(
                "Unsupported ENVI data type {} (need 4=float32 or 5=float64)",
                other
            ))),
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            EnviDataType::Float32 => 4,
            EnviDataType::Float64 => 5,
        }
    }

    /// Cell size in bytes
    pub fn size(&self) -> usize {
        match self {
            EnviDataType::Float32 => 4,
            EnviDataType::Float64 => 8,
        }
    }
}

/// Parsed ENVI header for a flat binary raster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnviHeader {
    pub samples: usize,
    pub lines: usize,
    pub bands: usize,
    pub interleave: Interleave,
    pub data_type: EnviDataType,
    pub header_offset: u64,
    pub byte_order: u8,
}

impl EnviHeader {
    /// Parse ENVI header text.
    ///
    /// Accepts `key = value` lines after the `ENVI` magic. Keys are matched
    /// case-insensitively, `{ ... }` values may span lines, unknown keys are
    /// ignored.
    pub fn parse(text: &str) -> HsResult<Self> {
        let mut lines = text.lines();

        let magic = lines
            .find(|l| !l.trim().is_empty())
            .unwrap_or("")
            .trim();
        if !magic.eq_ignore_ascii_case("ENVI") {
            return Err(HypersegError::InvalidHeader(
                "Missing ENVI magic line".to_string(),
            ));
        }

        let mut fields: HashMap<String, String> = HashMap::new();
        let mut pending: Option<(String, String)> = None;

        for raw in lines {
            if let Some((key, mut value)) = pending.take() {
                value.push(' ');
                value.push_str(raw.trim());
                if value.contains('}') {
                    fields.insert(key, Self::strip_braces(&value));
                } else {
                    pending = Some((key, value));
                }
                continue;
            }

            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }
            let eq = match line.find('=') {
                Some(i) => i,
                None => continue,
            };
            let key = line[..eq].trim().to_lowercase();
            let value = line[eq + 1..].trim().to_string();

            if value.starts_with('{') && !value.contains('}') {
                pending = Some((key, value));
            } else {
                fields.insert(key, Self::strip_braces(&value));
            }
        }

        if pending.is_some() {
            return Err(HypersegError::InvalidHeader(
                "Unterminated '{' value".to_string(),
            ));
        }

        let samples = Self::required_usize(&fields, "samples")?;
        let lines = Self::required_usize(&fields, "lines")?;
        let bands = Self::required_usize(&fields, "bands")?;
        let interleave = Interleave::from_keyword(Self::required(&fields, "interleave")?)?;
        let data_type_code = Self::required(&fields, "data type")?
            .parse::<u32>()
            .map_err(|_| {
                HypersegError::InvalidHeader("'data type' is not an integer".to_string())
            })?;
        let data_type = EnviDataType::from_code(data_type_code)?;

        let header_offset = Self::optional_u64(&fields, "header offset", 0)?;
        let byte_order = Self::optional_u64(&fields, "byte order", 0)? as u8;

        if samples == 0 || lines == 0 || bands == 0 {
            return Err(HypersegError::InvalidHeader(format!(
                "Zero-sized raster: {} lines x {} bands x {} samples",
                lines, bands, samples
            )));
        }

        Ok(EnviHeader {
            samples,
            lines,
            bands,
            interleave,
            data_type,
            header_offset,
            byte_order,
        })
    }

    /// Header for the single-band float32 label product
    pub fn label_header(lines: usize, samples: usize) -> Self {
        EnviHeader {
            samples,
            lines,
            bands: 1,
            interleave: Interleave::Bil,
            data_type: EnviDataType::Float32,
            header_offset: 0,
            byte_order: 0,
        }
    }

    /// Format the header back out as ENVI header text
    pub fn to_header_text(&self) -> String {
        format!(
            "ENVI\n\
             samples = {}\n\
             lines = {}\n\
             bands = {}\n\
             header offset = {}\n\
             file type = ENVI Standard\n\
             data type = {}\n\
             interleave = {}\n\
             byte order = {}\n",
            self.samples,
            self.lines,
            self.bands,
            self.header_offset,
            self.data_type.code(),
            self.interleave.keyword(),
            self.byte_order
        )
    }

    /// Bytes occupied by one full line across all bands
    pub fn line_stride(&self) -> usize {
        self.bands * self.samples * self.data_type.size()
    }

    fn strip_braces(value: &str) -> String {
        value
            .trim()
            .trim_start_matches('{')
            .trim_end_matches('}')
            .trim()
            .to_string()
    }

    fn required<'a>(fields: &'a HashMap<String, String>, key: &str) -> HsResult<&'a str> {
        fields
            .get(key)
            .map(|s| s.as_str())
            .ok_or_else(|| HypersegError::InvalidHeader(format!("Missing '{}' field", key)))
    }

    fn required_usize(fields: &HashMap<String, String>, key: &str) -> HsResult<usize> {
        Self::required(fields, key)?.parse::<usize>().map_err(|_| {
            HypersegError::InvalidHeader(format!("'{}' is not a valid integer", key))
        })
    }

    fn optional_u64(fields: &HashMap<String, String>, key: &str, default: u64) -> HsResult<u64> {
        match fields.get(key) {
            Some(v) => v.parse::<u64>().map_err(|_| {
                HypersegError::InvalidHeader(format!("'{}' is not a valid integer", key))
            }),
            None => Ok(default),
        }
    }
}
