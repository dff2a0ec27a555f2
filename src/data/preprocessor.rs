// ============================================================
// Layer 4 - Text Preprocessor
// ============================================================
// Normalises premise and hypothesis strings before tokenisation.
//
// The competition text is scraped from many sources and many
// languages. Common debris:
//   - Non-breaking spaces (U+00A0) and zero-width spaces (U+200B)
//   - Byte order marks left at the start of a field
//   - Embedded newlines / tabs from multi-line quoted CSV cells
//   - Runs of spaces
//
// Each input is a single sentence or short paragraph, so unlike
// a document cleaner we flatten everything onto one line: all
// whitespace variants become one ASCII space, control characters
// are dropped, and the result is trimmed. Letters, digits and
// punctuation in every script pass through untouched.

use crate::domain::nli_pair::NliRow;

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Clean one text field onto a single trimmed line
    pub fn clean(&self, text: &str) -> String {
        let mut out        = String::with_capacity(text.len());
        let mut last_space = true; // suppresses leading spaces

        for c in text.chars() {
            let c = match c {
                '\u{00A0}' | '\u{200B}' | '\u{FEFF}' | '\u{3000}' => ' ',
                c if c.is_whitespace() => ' ',
                c if c.is_control() => continue,
                c => c,
            };

            if c == ' ' {
                if !last_space {
                    out.push(' ');
                }
                last_space = true;
            } else {
                out.push(c);
                last_space = false;
            }
        }

        // At most one trailing space can remain
        if out.ends_with(' ') {
            out.pop();
        }
        out
    }

    /// Cleaned (premise, hypothesis) of a row
    pub fn clean_pair(&self, row: &NliRow) -> (String, String) {
        (self.clean(&row.premise), self.clean(&row.hypothesis))
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}
