//! Line-oriented network file format.
//!
//! ```text
//! <profile count>
//! <name>
//! <image filename, empty if none>
//! <status, empty if none>
//! <friend name>...
//! <empty line ending the friend block>
//! ```
//!
//! The header block repeats once per profile. Nothing is escaped, so names,
//! statuses and filenames cannot contain line breaks. [`Profile`] refuses
//! names containing `\r` or `\n`, since CRLF input is accepted on read and a
//! trailing `\r` would not survive a reload.

use std::io::{BufRead, BufWriter, Lines, Write};

use serde::Serialize;

use crate::{ImageLoadError, ImageLoader, Profile, ProfileStore};

#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum CodecError {
    #[error("i/o error: {0}")]
    Io(String),
    #[error("line {line}: {detail}")]
    Format { line: usize, detail: String },
}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// An image that could not be reacquired while loading. The profile keeps
/// its image filename but has no image.
#[derive(Debug, Clone, Serialize, Eq, PartialEq)]
pub struct ImageWarning {
    pub profile: String,
    pub error: ImageLoadError,
}

#[derive(Debug, Clone, Default, Serialize, Eq, PartialEq)]
pub struct LoadReport {
    pub profiles: usize,
    pub image_warnings: Vec<ImageWarning>,
}

struct NumberedLines<R> {
    lines: Lines<R>,
    line: usize,
}

impl<R: BufRead> NumberedLines<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }

    fn next_line(&mut self, expected: &str) -> Result<String, CodecError> {
        self.line += 1;
        match self.lines.next() {
            Some(line) => Ok(line?),
            None => Err(self.format_error(format!("unexpected end of file, expected {expected}"))),
        }
    }

    fn format_error(&self, detail: impl Into<String>) -> CodecError {
        CodecError::Format {
            line: self.line,
            detail: detail.into(),
        }
    }
}

/// Write `store` in the network file format.
///
/// # Errors
/// Returns [`CodecError::Io`] when the writer fails.
pub fn encode_to_writer<W: Write>(store: &ProfileStore, writer: W) -> Result<(), CodecError> {
    let mut writer = BufWriter::new(writer);
    writeln!(writer, "{}", store.len())?;
    for profile in store.profiles() {
        writeln!(writer, "{}", profile.name())?;
        writeln!(writer, "{}", profile.image_path())?;
        writeln!(writer, "{}", profile.status())?;
        for friend in profile.friends() {
            writeln!(writer, "{friend}")?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

/// Parse a network file into a fresh store.
///
/// Friend lines go through [`Profile::add_friend`], so duplicates in the file
/// collapse to the first occurrence. A name repeated later in the file
/// replaces the earlier profile. Lines after the last counted profile are
/// ignored.
///
/// # Errors
/// Returns [`CodecError::Format`] for a bad count, a blank profile name, or a
/// record cut short by end of file, and [`CodecError::Io`] when reading fails.
pub fn decode_from_reader<R, L>(
    reader: R,
    loader: &L,
) -> Result<(ProfileStore, LoadReport), CodecError>
where
    R: BufRead,
    L: ImageLoader + ?Sized,
{
    let mut lines = NumberedLines::new(reader);
    let count_line = lines.next_line("profile count")?;
    let count: usize = count_line
        .trim()
        .parse()
        .map_err(|err| lines.format_error(format!("invalid profile count {count_line:?}: {err}")))?;

    let mut store = ProfileStore::new();
    let mut report = LoadReport::default();
    for _ in 0..count {
        let name = lines.next_line("profile name")?;
        let mut profile = Profile::new(name).map_err(|err| lines.format_error(err.to_string()))?;
        let image_path = lines.next_line("image filename")?;
        let status = lines.next_line("status")?;

        if !image_path.is_empty() {
            match loader.load_image(&image_path) {
                Ok(image) => profile.set_image(image),
                Err(error) => {
                    tracing::warn!(
                        profile = profile.name(),
                        filename = %image_path,
                        reason = %error.reason,
                        "image could not be reacquired; keeping filename only"
                    );
                    report.image_warnings.push(ImageWarning {
                        profile: profile.name().to_string(),
                        error,
                    });
                }
            }
            profile.set_image_path(image_path);
        }
        profile.set_status(status);

        loop {
            let friend = lines.next_line("friend name or blank line")?;
            if friend.is_empty() {
                break;
            }
            profile.add_friend(&friend);
        }

        store.add_profile(profile);
    }

    report.profiles = store.len();
    Ok((store, report))
}
