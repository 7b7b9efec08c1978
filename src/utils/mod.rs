use std::path::Path;

use regex::Regex;

/// Guess a MIME type from the file extension. Unknown extensions are sent as raw bytes.
pub fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// Rounded percentage of `sent` over `total`, `None` when the total is unknown.
pub fn percent(sent: u64, total: u64) -> Option<u8> {
    if total == 0 {
        return None;
    }
    let sent = sent.min(total) as u128;
    let total = total as u128;
    Some(((sent * 100 + total / 2) / total) as u8)
}

/// Sanitize filename to remove invalid characters
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            _ => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Pull the filename out of a `Content-Disposition` header value.
pub fn filename_from_content_disposition(value: &str) -> Option<String> {
    let re = Regex::new(r#"(?i)filename\*?=(?:UTF-8'')?"?([^";]+)"?"#).ok()?;
    let caps = re.captures(value)?;
    let name = sanitize_filename(&caps[1]);
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime(Path::new("paper.PDF")), "application/pdf");
        assert_eq!(guess_mime(Path::new("scan.jpeg")), "image/jpeg");
        assert_eq!(guess_mime(Path::new("README")), "application/octet-stream");
    }

    #[test]
    fn test_percent_rounds_and_clamps() {
        assert_eq!(percent(0, 0), None);
        assert_eq!(percent(0, 10), Some(0));
        assert_eq!(percent(1, 3), Some(33));
        assert_eq!(percent(2, 3), Some(67));
        assert_eq!(percent(10, 10), Some(100));
        assert_eq!(percent(11, 10), Some(100));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("test/file.txt"), "test_file.txt");
        assert_eq!(sanitize_filename("normal-name.txt"), "normal-name.txt");
    }

    #[test]
    fn test_filename_from_content_disposition() {
        assert_eq!(
            filename_from_content_disposition("attachment; filename=summaries.txt").as_deref(),
            Some("summaries.txt")
        );
        assert_eq!(
            filename_from_content_disposition(r#"attachment; filename="a:b.txt""#).as_deref(),
            Some("a_b.txt")
        );
        assert_eq!(
            filename_from_content_disposition("attachment; filename*=UTF-8''notes.txt").as_deref(),
            Some("notes.txt")
        );
        assert_eq!(filename_from_content_disposition("inline"), None);
    }
}
