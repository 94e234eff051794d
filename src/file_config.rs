//! INI file loading for token writer settings.
//!
//! A writer section looks like:
//!
//! ```ini
//! [logentries]
//! token = 2bfbea1e-10c3-4419-bdad-7e6435882e1f
//! use_tls = yes
//! persistent = true
//! timeout = 2.5
//! line_separator = \r\n
//! ```
//!
//! Only `token` is required. Values use `rust-ini` escape rules, so `\n`,
//! `\r` and `\t` in `line_separator` decode to the control characters.
//! Files are decoded with `encoding_rs`; UTF-8 is assumed when no encoding
//! label is given.

use std::{fs, io::ErrorKind, path::Path};

use encoding_rs::Encoding;
use ini::{Ini, Properties};

use crate::{
    error::WriterError,
    writer::{TokenWriterBuilder, WriterConfig},
};

const KNOWN_KEYS: [&str; 5] = ["token", "use_tls", "persistent", "timeout", "line_separator"];

/// Read writer settings from `section` of the INI file at `path` into a
/// builder, so callers can still attach a formatter or connector.
///
/// `section` of `None` reads keys that appear before any section header.
pub fn load_writer_builder(
    path: impl AsRef<Path>,
    section: Option<&str>,
    encoding: Option<&str>,
) -> Result<TokenWriterBuilder, WriterError> {
    let path = path.as_ref();
    let bytes = read_file_bytes(path)?;
    if bytes.is_empty() {
        return Err(WriterError::invalid(format!(
            "{} is an empty file",
            path.display()
        )));
    }
    let text = decode_with_encoding(&bytes, encoding.unwrap_or("utf-8"))?;
    let ini = Ini::load_from_str(&text).map_err(|err| {
        WriterError::invalid(format!("{} is invalid: {err}", path.display()))
    })?;
    let props = ini.section(section).ok_or_else(|| {
        WriterError::invalid(format!(
            "{} has no [{}] section",
            path.display(),
            section.unwrap_or("<general>")
        ))
    })?;
    builder_from_properties(props)
}

/// Read and validate writer settings from `section` of the INI file at
/// `path`.
pub fn load_writer_config(
    path: impl AsRef<Path>,
    section: Option<&str>,
    encoding: Option<&str>,
) -> Result<WriterConfig, WriterError> {
    load_writer_builder(path, section, encoding)?.build_config()
}

fn read_file_bytes(path: &Path) -> Result<Vec<u8>, WriterError> {
    fs::read(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => WriterError::Io(std::io::Error::new(
            ErrorKind::NotFound,
            format!("{} doesn't exist", path.display()),
        )),
        _ => WriterError::Io(err),
    })
}

fn decode_with_encoding(bytes: &[u8], label: &str) -> Result<String, WriterError> {
    let normalized_label = label.trim().to_ascii_lowercase();
    let encoding = Encoding::for_label(normalized_label.as_bytes())
        .ok_or_else(|| WriterError::invalid(format!("unknown encoding {label}")))?;
    let (decoded, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(WriterError::invalid(format!(
            "file is not valid {}",
            encoding.name()
        )));
    }
    Ok(decoded.into_owned())
}

fn builder_from_properties(props: &Properties) -> Result<TokenWriterBuilder, WriterError> {
    if let Some((key, _)) = props
        .iter()
        .find(|(key, _)| !KNOWN_KEYS.contains(&key.trim()))
    {
        return Err(WriterError::invalid(format!("unknown key {key}")));
    }

    let token = props.get("token").unwrap_or_default();
    let mut builder = TokenWriterBuilder::new(token);
    if let Some(value) = props.get("use_tls") {
        builder = builder.with_tls(parse_bool("use_tls", value)?);
    }
    if let Some(value) = props.get("persistent") {
        builder = builder.with_persistent(parse_bool("persistent", value)?);
    }
    if let Some(value) = props.get("timeout") {
        let secs = value
            .trim()
            .parse::<f64>()
            .map_err(|_| WriterError::invalid(format!("timeout must be a number, got {value:?}")))?;
        builder = builder.with_connect_timeout_secs(secs);
    }
    if let Some(value) = props.get("line_separator") {
        builder = builder.with_line_separator(value.to_owned());
    }
    Ok(builder)
}

fn parse_bool(key: &str, value: &str) -> Result<bool, WriterError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(WriterError::invalid(format!(
            "{key} must be a boolean, got {value:?}"
        ))),
    }
}
