//! The archive manifest written as `META-INF/MANIFEST.MF`.
//!
//! The manifest format is a list of `Name: value` headers terminated by CRLF.
//! Lines longer than 72 bytes are continued on the next line with a single
//! leading space, and the main section ends with an empty line.

/// Archive path of the manifest entry.
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

/// Value of the `Manifest-Version` header.
pub const MANIFEST_VERSION: &str = "1.0";

const MAX_LINE_BYTES: usize = 72;
const LINE_END: &str = "\r\n";

/// Main-section attributes of the archive manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveManifest {
    main_class: Option<String>,
}

impl ArchiveManifest {
    /// Create a manifest with an optional entry point.
    ///
    /// A blank main class is treated as absent.
    #[must_use]
    pub fn new(main_class: Option<&str>) -> Self {
        let main_class = main_class
            .map(str::trim)
            .filter(|class| !class.is_empty())
            .map(str::to_owned);
        Self { main_class }
    }

    /// Return the entry point recorded in the manifest.
    #[must_use]
    pub fn main_class(&self) -> Option<&str> {
        self.main_class.as_deref()
    }

    /// Render the manifest bytes.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        push_header(&mut out, "Manifest-Version", MANIFEST_VERSION);
        if let Some(class) = &self.main_class {
            push_header(&mut out, "Main-Class", class);
        }
        out.push_str(LINE_END);
        out
    }
}

fn push_header(out: &mut String, name: &str, value: &str) {
    push_wrapped(out, &format!("{name}: {value}"));
}

fn push_wrapped(out: &mut String, line: &str) {
    let mut width = 0;
    for ch in line.chars() {
        let len = ch.len_utf8();
        if width + len > MAX_LINE_BYTES {
            out.push_str(LINE_END);
            out.push(' ');
            width = 1;
        }
        out.push(ch);
        width += len;
    }
    out.push_str(LINE_END);
}
