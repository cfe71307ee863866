/*!
 * Localization directives embedded in comments.
 *
 * `_skip` / `_text` apply to the next entry only; `_bskip` ... `_eskip` and
 * `_btext` ... `_etext` delimit blocks, which may nest. Outside any scope the
 * configured default applies.
 */

use log::{trace, warn};

#[derive(Debug, Clone, Default)]
pub struct LocalizationDirectives {
    enabled: bool,
    localize_outside: bool,
    next_entry: Option<bool>,
    blocks: Vec<bool>,
}

impl LocalizationDirectives {
    pub fn new(enabled: bool, localize_outside: bool) -> Self {
        Self {
            enabled,
            localize_outside,
            next_entry: None,
            blocks: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.next_entry = None;
        self.blocks.clear();
    }

    /// Look for a directive in the text of a comment (marker removed)
    pub fn process(&mut self, comment: &str) {
        if !self.enabled {
            return;
        }
        let directive = comment.trim().split_whitespace().next().unwrap_or("");
        match directive.to_ascii_lowercase().as_str() {
            "_skip" => self.next_entry = Some(false),
            "_text" => self.next_entry = Some(true),
            "_bskip" => self.blocks.push(false),
            "_btext" => self.blocks.push(true),
            "_eskip" | "_etext" => {
                let expected = directive.eq_ignore_ascii_case("_etext");
                match self.blocks.pop() {
                    Some(open) if open == expected => {}
                    Some(_) => warn!("Directive {} closes a block of the other kind", directive),
                    None => warn!("Directive {} without an open block", directive),
                }
            }
            _ => return,
        }
        trace!("Localization directive {}", directive);
    }

    /// Whether a directive currently decides extraction
    pub fn is_within_scope(&self) -> bool {
        self.enabled && (self.next_entry.is_some() || !self.blocks.is_empty())
    }

    /// Decision of the innermost scope; a next-entry directive is consumed
    /// when `consume` is set
    pub fn is_localizable(&mut self, consume: bool) -> bool {
        if let Some(value) = self.next_entry {
            if consume {
                self.next_entry = None;
            }
            return value;
        }
        self.blocks.last().copied().unwrap_or(self.localize_outside)
    }

    /// Decision outside any directive scope
    pub fn localize_outside(&self) -> bool {
        !self.enabled || self.localize_outside
    }
}
