use std::borrow::Cow;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::error::SynthesisError;

use super::GraphemeToPhoneme;

/// Grapheme-to-phoneme fallback backed by the `espeak-ng` binary.
///
/// Produces one IPA character per phone token. Only useful with an
/// IPA-based symbol table; models trained on ARPAbet vocabularies need
/// their own [`GraphemeToPhoneme`] implementation, and the encoder's
/// fatal vocabulary-miss policy surfaces the mismatch immediately.
pub struct EspeakG2p {
    /// Path to the espeak-ng binary; `None` uses `espeak-ng` from PATH.
    bin_path: Option<PathBuf>,
    /// Path to the espeak-ng data directory, for bundled installs.
    data_path: Option<PathBuf>,
    /// espeak-ng voice code, e.g. `"en-us"`.
    lang: String,
}

impl EspeakG2p {
    pub fn new(lang: impl Into<String>) -> Self {
        Self {
            bin_path: None,
            data_path: None,
            lang: lang.into(),
        }
    }

    /// Use an explicit binary and data directory instead of PATH lookup.
    pub fn with_paths(
        lang: impl Into<String>,
        bin_path: Option<PathBuf>,
        data_path: Option<PathBuf>,
    ) -> Self {
        Self {
            bin_path,
            data_path,
            lang: lang.into(),
        }
    }

    fn run(&self, input: &str) -> Result<String, SynthesisError> {
        let bin = self
            .bin_path
            .as_ref()
            .map(|p| p.as_os_str().to_os_string())
            .unwrap_or_else(|| "espeak-ng".into());

        let mut command = Command::new(bin);
        command.args(["--ipa", "--stdin", "-q", "-v", &self.lang]);
        if let Some(data) = &self.data_path {
            command.arg(format!("--path={}", data.display()));
        }

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SynthesisError::EspeakNotFound
                } else {
                    SynthesisError::Io(e)
                }
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // espeak-ng treats stdin as line-oriented input; without a final
            // line terminator the last token can be under-processed.
            let payload = canonicalize_stdin_payload(input);
            stdin.write_all(payload.as_bytes())?;
        }

        let output = child.wait_with_output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SynthesisError::G2pFailed(format!(
                "espeak-ng exited with code {:?}: {stderr}",
                output.status.code()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl GraphemeToPhoneme for EspeakG2p {
    fn phones(&self, token: &str) -> Result<Vec<String>, SynthesisError> {
        let ipa = self.run(token)?;
        Ok(ipa
            .chars()
            .filter(|ch| *ch != '_' && !ch.is_whitespace())
            .map(|ch| ch.to_string())
            .collect())
    }
}

fn canonicalize_stdin_payload(input: &str) -> Cow<'_, str> {
    if input.ends_with('\n') {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(format!("{input}\n"))
    }
}
