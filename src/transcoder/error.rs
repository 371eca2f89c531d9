//! ffmpeg error classification

/// Kind of ffmpeg failure
#[derive(Debug, Clone, PartialEq)]
pub enum FfmpegErrorKind {
    /// Encoder missing from this ffmpeg build
    EncoderNotSupported(String),
    /// Input file not found
    InputNotFound,
    /// Input file unreadable or corrupt
    InputCorrupted,
    /// Permission denied
    PermissionDenied,
    /// Disk full
    DiskFull,
    /// Output exists and ffmpeg refused to overwrite it
    OutputExists,
    /// Option rejected by ffmpeg or an encoder
    InvalidOption(String),
    /// Anything else
    Unknown(String),
}

/// Classified ffmpeg failure
#[derive(Debug, Clone)]
pub struct FfmpegError {
    /// Failure kind
    pub kind: FfmpegErrorKind,
    /// Message shown to the user
    pub user_message: String,
    /// Suggested fix
    pub suggestion: Option<String>,
}

impl FfmpegError {
    /// Classify ffmpeg stderr
    pub fn parse(stderr: &str) -> Self {
        let stderr_lower = stderr.to_lowercase();

        if stderr_lower.contains("unknown encoder")
            || stderr_lower.contains("encoder") && stderr_lower.contains("not found")
            || stderr_lower.contains("no such encoder")
        {
            let encoder = Self::extract_quoted(stderr, "encoder");
            return Self::encoder_not_supported(&encoder);
        }

        // Checked before the generic "no such file" match: the message names the output
        if stderr_lower.contains("already exists") {
            return Self::output_exists();
        }

        if stderr_lower.contains("no such file")
            || stderr_lower.contains("does not exist")
            || stderr_lower.contains("file not found")
        {
            return Self::input_not_found();
        }

        if stderr_lower.contains("invalid data found")
            || stderr_lower.contains("corrupt")
            || stderr_lower.contains("moov atom not found")
        {
            return Self::input_corrupted();
        }

        if stderr_lower.contains("permission denied") || stderr_lower.contains("access denied") {
            return Self::permission_denied();
        }

        if stderr_lower.contains("no space left")
            || stderr_lower.contains("disk full")
            || stderr_lower.contains("not enough space")
        {
            return Self::disk_full();
        }

        if stderr_lower.contains("option") && stderr_lower.contains("not found")
            || stderr_lower.contains("unrecognized option")
            || stderr_lower.contains("invalid option")
        {
            let option = Self::extract_quoted(stderr, "option");
            return Self::invalid_option(&option);
        }

        Self::unknown(stderr)
    }

    fn encoder_not_supported(encoder: &str) -> Self {
        let suggestion = if encoder.contains("svtav1") {
            "Install an ffmpeg build compiled with --enable-libsvtav1"
        } else if encoder.contains("opus") {
            "Install an ffmpeg build compiled with --enable-libopus"
        } else {
            "Install an ffmpeg build that includes this encoder"
        };
        Self {
            kind: FfmpegErrorKind::EncoderNotSupported(encoder.to_string()),
            user_message: format!("Encoder '{}' is not available in this ffmpeg", encoder),
            suggestion: Some(suggestion.to_string()),
        }
    }

    fn input_not_found() -> Self {
        Self {
            kind: FfmpegErrorKind::InputNotFound,
            user_message: "The source file or output folder was not found".to_string(),
            suggestion: Some("Check that the file has not been moved or deleted".to_string()),
        }
    }

    fn input_corrupted() -> Self {
        Self {
            kind: FfmpegErrorKind::InputCorrupted,
            user_message: "The source file is corrupt or not a video".to_string(),
            suggestion: Some("Check that the file plays correctly".to_string()),
        }
    }

    fn permission_denied() -> Self {
        Self {
            kind: FfmpegErrorKind::PermissionDenied,
            user_message: "Permission denied".to_string(),
            suggestion: Some("Choose an output folder you can write to".to_string()),
        }
    }

    fn disk_full() -> Self {
        Self {
            kind: FfmpegErrorKind::DiskFull,
            user_message: "The output disk is full".to_string(),
            suggestion: Some("Free some space on the output drive".to_string()),
        }
    }

    fn output_exists() -> Self {
        Self {
            kind: FfmpegErrorKind::OutputExists,
            user_message: "The output file already exists".to_string(),
            suggestion: Some("Pick a different output file name".to_string()),
        }
    }

    fn invalid_option(option: &str) -> Self {
        Self {
            kind: FfmpegErrorKind::InvalidOption(option.to_string()),
            user_message: format!("ffmpeg rejected option '{}'", option),
            suggestion: Some("Your ffmpeg may be too old for these settings".to_string()),
        }
    }

    fn unknown(raw: &str) -> Self {
        // Prefer the last line that looks like an error
        let error_line = raw
            .lines()
            .map(str::trim)
            .filter(|line| {
                let lower = line.to_lowercase();
                lower.contains("error")
                    || lower.contains("failed")
                    || lower.contains("cannot")
                    || lower.contains("unable")
            })
            .last()
            .or_else(|| raw.lines().map(str::trim).filter(|l| !l.is_empty()).last())
            .unwrap_or("ffmpeg failed while encoding");

        Self {
            kind: FfmpegErrorKind::Unknown(error_line.to_string()),
            user_message: format!("Encoding failed: {}", Self::truncate_message(error_line, 100)),
            suggestion: None,
        }
    }

    /// First single-quoted name on a line mentioning `keyword`
    fn extract_quoted(stderr: &str, keyword: &str) -> String {
        for line in stderr.lines() {
            if line.to_lowercase().contains(keyword) {
                if let Some(start) = line.find('\'') {
                    if let Some(end) = line[start + 1..].find('\'') {
                        return line[start + 1..start + 1 + end].to_string();
                    }
                }
            }
        }
        "unknown".to_string()
    }

    fn truncate_message(msg: &str, max_len: usize) -> String {
        if msg.chars().count() <= max_len {
            msg.to_string()
        } else {
            let cut: String = msg.chars().take(max_len).collect();
            format!("{}...", cut)
        }
    }

    /// Full user-facing message including the suggestion
    pub fn format_user_message(&self) -> String {
        let mut msg = self.user_message.clone();
        if let Some(ref suggestion) = self.suggestion {
            msg.push_str(". ");
            msg.push_str(suggestion);
        }
        msg
    }
}
