//! Descriptor types for a parsed component file.

use smol_str::SmolStr;
use text_edit::Span;

/// The top-level blocks of a single-file component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SfcDescriptor {
    pub template: Option<SfcBlock>,
    /// `<script>` without `setup`.
    pub script: Option<SfcBlock>,
    /// `<script setup>`.
    pub script_setup: Option<SfcBlock>,
    pub styles: Vec<SfcBlock>,
    /// Any other top-level element, e.g. `<i18n>`.
    pub custom_blocks: Vec<SfcBlock>,
}

impl SfcDescriptor {
    /// True when the component has neither script block.
    pub fn is_script_less(&self) -> bool {
        self.script.is_none() && self.script_setup.is_none()
    }

    /// The script language shared by both script blocks, if any is declared.
    pub fn script_lang(&self) -> Option<&str> {
        self.script
            .as_ref()
            .and_then(SfcBlock::lang)
            .or_else(|| self.script_setup.as_ref().and_then(SfcBlock::lang))
    }
}

/// One top-level block.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SfcBlock {
    /// The tag name, e.g. `script`.
    pub tag: SmolStr,
    pub attrs: Vec<SfcAttribute>,
    /// The raw text between the opening and closing tags.
    pub content: String,
    /// The span of [`SfcBlock::content`] in the component source.
    pub content_span: Span,
    /// The span of the whole block including its tags.
    pub span: Span,
}

impl SfcBlock {
    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.iter().find(|a| a.name == name).map(|a| &a.value)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// The text value of attribute `name`; `None` for boolean attributes.
    pub fn attr_text(&self, name: &str) -> Option<&str> {
        match self.attr(name)? {
            AttrValue::Text(text) => Some(text),
            AttrValue::True => None,
        }
    }

    pub fn lang(&self) -> Option<&str> {
        self.attr_text("lang").filter(|lang| !lang.is_empty())
    }

    pub fn src(&self) -> Option<&str> {
        self.attr_text("src")
    }

    pub fn is_setup(&self) -> bool {
        self.has_attr("setup")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SfcAttribute {
    pub name: SmolStr,
    pub value: AttrValue,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttrValue {
    /// A boolean attribute such as `setup`.
    True,
    /// A quoted or unquoted value, without quotes.
    Text(String),
}
