use thiserror::Error;

/// Longest filename (in bytes) written to disk
pub const MAX_FILENAME_LEN: usize = 255;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

/// Sanitizes a client-supplied filename so it can be joined onto the downloads root.
/// Returns the sanitized filename or an error if nothing usable remains.
pub fn sanitize_filename(filename: &str) -> Result<String, ValidationError> {
    // Keep only the last path component, whichever separator the client used
    let name = filename.rsplit(['/', '\\']).next().unwrap_or("").trim();

    if name != filename {
        tracing::warn!("Path components stripped from upload name: {}", filename);
    }

    if name.is_empty() || name == "." || name == ".." {
        return Err(ValidationError {
            code: "INVALID_FILENAME",
            message: "Filename cannot be empty".to_string(),
        });
    }

    // Replace reserved characters, keep the rest of Unicode as-is
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_control() || matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|' | ';') {
                '_'
            } else {
                c
            }
        })
        .collect();

    // Limit length safely for UTF-8
    let sanitized = if sanitized.len() > MAX_FILENAME_LEN {
        let mut end = MAX_FILENAME_LEN;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized[..end].to_string()
    } else {
        sanitized
    };

    if sanitized.starts_with('.') {
        return Err(ValidationError {
            code: "HIDDEN_FILE",
            message: "Hidden files (starting with '.') are not allowed".to_string(),
        });
    }

    Ok(sanitized)
}
