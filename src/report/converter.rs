use std::io::{Read, Write};
use std::process::{Command, Stdio};

use super::ReportError;

/// External HTML to PDF converter reading HTML on stdin and writing PDF on stdout.
#[derive(Debug, Clone)]
pub struct HtmlToPdf {
    program: String,
    args: Vec<String>,
}

impl HtmlToPdf {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: vec!["--quiet".into(), "-".into(), "-".into()],
        }
    }

    #[cfg(test)]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    #[cfg(test)]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Blocking; call it from `web::block`.
    pub fn convert(&self, html: &str) -> Result<Vec<u8>, ReportError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ReportError::Converter(format!("cannot start {}: {}", self.program, e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ReportError::Converter("converter stdin unavailable".into()))?;
        let input = html.as_bytes().to_vec();
        // stdin and stderr each get a thread; any one full pipe would block the others.
        let writer = std::thread::spawn(move || stdin.write_all(&input));
        let stderr_reader = child.stderr.take().map(|mut stderr| {
            std::thread::spawn(move || {
                let mut buf = Vec::new();
                stderr.read_to_end(&mut buf).map(|_| buf)
            })
        });

        let mut pdf = Vec::new();
        if let Some(mut stdout) = child.stdout.take() {
            stdout.read_to_end(&mut pdf)?;
        }

        let status = child.wait()?;
        let written = writer
            .join()
            .map_err(|_| ReportError::Converter("stdin writer panicked".into()))?;
        let stderr = match stderr_reader {
            Some(handle) => handle
                .join()
                .map_err(|_| ReportError::Converter("stderr reader panicked".into()))??,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            tracing::warn!(program = %self.program, status = %status, stderr = %stderr.trim(), "HTML to PDF conversion failed");
            return Err(ReportError::Converter(format!("{} exited with {}", self.program, status)));
        }

        written?;

        if pdf.is_empty() {
            return Err(ReportError::Converter(format!("{} produced no output", self.program)));
        }

        Ok(pdf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_arguments_stream_through_stdio() {
        let converter = HtmlToPdf::new("wkhtmltopdf");
        assert_eq!(converter.args, ["--quiet", "-", "-"]);
        assert_eq!(converter.program(), "wkhtmltopdf");
    }

    #[cfg(unix)]
    #[test]
    fn output_is_whatever_the_program_writes() {
        let converter = HtmlToPdf::new("cat").with_args(Vec::<String>::new());
        let bytes = converter.convert("<h1>Expense Report</h1>").unwrap();
        assert_eq!(bytes, b"<h1>Expense Report</h1>");
    }

    #[cfg(unix)]
    #[test]
    fn noisy_stderr_does_not_stall_the_conversion() {
        // Far more stderr than a pipe buffer holds, written before stdout.
        let converter = HtmlToPdf::new("sh").with_args(["-c", "yes warning | head -c 262144 >&2; cat"]);
        let bytes = converter.convert("<p>ok</p>").unwrap();
        assert_eq!(bytes, b"<p>ok</p>");
    }

    #[cfg(unix)]
    #[test]
    fn failing_program_is_reported() {
        let converter = HtmlToPdf::new("false").with_args(Vec::<String>::new());
        assert!(matches!(converter.convert("<p></p>"), Err(ReportError::Converter(_))));
    }

    #[test]
    fn missing_program_is_reported() {
        let converter = HtmlToPdf::new("definitely-not-an-installed-converter");
        match converter.convert("<p></p>") {
            Err(ReportError::Converter(message)) => assert!(message.contains("cannot start")),
            other => panic!("unexpected result: {:?}", other.map(|b| b.len())),
        }
    }
}
