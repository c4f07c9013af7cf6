//! Top-level block parser.

use crate::ast::{AttrValue, SfcAttribute, SfcBlock, SfcDescriptor};
use crate::error::{SfcError, SfcErrorKind};
use crate::lexer::{Lexer, Token, TokenKind};
use smol_str::SmolStr;
use std::iter::Peekable;
use text_edit::Span;

pub(crate) struct Parser<'src> {
    source: &'src str,
    pos: usize,
    descriptor: SfcDescriptor,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            pos: 0,
            descriptor: SfcDescriptor::default(),
        }
    }

    pub fn parse(mut self) -> Result<SfcDescriptor, SfcError> {
        while let Some(offset) = self.source[self.pos..].find('<') {
            let start = self.pos + offset;
            let rest = &self.source[start..];

            if rest.starts_with("<!--") {
                self.pos = rest
                    .find("-->")
                    .map_or(self.source.len(), |end| start + end + 3);
                continue;
            }
            // Text, stray closing tags and doctype-like declarations.
            if !rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
                self.pos = start + 1;
                continue;
            }

            let block = self.parse_block(start)?;
            self.pos = usize::from(block.span.end);
            self.add(block)?;
        }

        self.validate()?;
        Ok(self.descriptor)
    }

    fn parse_block(&self, start: usize) -> Result<SfcBlock, SfcError> {
        let mut tokens = Lexer::at(self.source, start).peekable();
        let open = self.next(&mut tokens);
        debug_assert_eq!(open.kind, TokenKind::LAngle);

        let name = self.next(&mut tokens);
        if name.kind != TokenKind::Word {
            return Err(unexpected("tag name", &name));
        }
        let tag = SmolStr::new(self.text(name.span));

        let mut attrs = Vec::new();
        let (head_end, self_closing) = loop {
            let token = self.next(&mut tokens);
            match token.kind {
                TokenKind::RAngle => break (usize::from(token.span.end), false),
                TokenKind::SlashRAngle => break (usize::from(token.span.end), true),
                TokenKind::Word => attrs.push(self.attribute(token, &mut tokens)?),
                TokenKind::Eof => {
                    return Err(SfcError::new(
                        SfcErrorKind::UnclosedBlock { tag: tag.to_string() },
                        Span::from_range(start..self.source.len()),
                    ))
                }
                _ => return Err(unexpected("attribute name or '>'", &token)),
            }
        };

        if self_closing {
            return Ok(SfcBlock {
                tag,
                attrs,
                content: String::new(),
                content_span: Span::from_range(head_end..head_end),
                span: Span::from_range(start..head_end),
            });
        }

        let (content_end, end) = self.find_close(&tag, head_end).ok_or_else(|| {
            SfcError::new(
                SfcErrorKind::UnclosedBlock { tag: tag.to_string() },
                Span::from_range(start..head_end),
            )
        })?;

        Ok(SfcBlock {
            tag,
            attrs,
            content: self.source[head_end..content_end].to_string(),
            content_span: Span::from_range(head_end..content_end),
            span: Span::from_range(start..end),
        })
    }

    fn attribute(
        &self,
        name: Token,
        tokens: &mut Peekable<Lexer<'src>>,
    ) -> Result<SfcAttribute, SfcError> {
        let has_value = tokens.peek().is_some_and(|t| t.kind == TokenKind::Eq);
        if !has_value {
            return Ok(SfcAttribute {
                name: SmolStr::new(self.text(name.span)),
                value: AttrValue::True,
                span: name.span,
            });
        }

        tokens.next();
        let value = self.next(tokens);
        let text = self.text(value.span);
        let text = match value.kind {
            TokenKind::DoubleQuoted | TokenKind::SingleQuoted => &text[1..text.len() - 1],
            TokenKind::Word => text,
            _ => return Err(unexpected("attribute value", &value)),
        };
        Ok(SfcAttribute {
            name: SmolStr::new(self.text(name.span)),
            value: AttrValue::Text(text.to_string()),
            span: name.span.cover(value.span),
        })
    }

    /// Content end and block end of the element `tag` whose content starts
    /// at `from`. Nested `<template>` elements are balanced.
    fn find_close(&self, tag: &str, from: usize) -> Option<(usize, usize)> {
        let nested = tag == "template";
        let mut depth = 1usize;
        let mut pos = from;
        while let Some(offset) = self.source[pos..].find('<') {
            let at = pos + offset;
            let rest = &self.source[at..];

            if let Some(after) = rest.strip_prefix("</").and_then(|r| r.strip_prefix(tag)) {
                let trimmed = after.trim_start();
                if trimmed.starts_with('>') {
                    let end = at + (rest.len() - trimmed.len()) + 1;
                    depth -= 1;
                    if depth == 0 {
                        return Some((at, end));
                    }
                    pos = end;
                    continue;
                }
            } else if nested {
                if let Some(after) = rest[1..].strip_prefix(tag) {
                    if after.starts_with(|c: char| c.is_ascii_whitespace() || c == '>') {
                        let head = after.find('>').map_or(after, |idx| &after[..idx]);
                        if !head.ends_with('/') {
                            depth += 1;
                        }
                    }
                }
            }
            pos = at + 1;
        }
        None
    }

    fn add(&mut self, block: SfcBlock) -> Result<(), SfcError> {
        let duplicate = |block: &SfcBlock, name: &str| {
            Err(SfcError::new(
                SfcErrorKind::DuplicateBlock {
                    block: name.to_string(),
                },
                block.span,
            ))
        };
        match block.tag.as_str() {
            "template" if self.descriptor.template.is_some() => duplicate(&block, "<template>"),
            "template" => {
                self.descriptor.template = Some(block);
                Ok(())
            }
            "script" if block.is_setup() => {
                if self.descriptor.script_setup.is_some() {
                    return duplicate(&block, "<script setup>");
                }
                self.descriptor.script_setup = Some(block);
                Ok(())
            }
            "script" if self.descriptor.script.is_some() => duplicate(&block, "<script>"),
            "script" => {
                self.descriptor.script = Some(block);
                Ok(())
            }
            "style" => {
                self.descriptor.styles.push(block);
                Ok(())
            }
            _ => {
                self.descriptor.custom_blocks.push(block);
                Ok(())
            }
        }
    }

    fn validate(&self) -> Result<(), SfcError> {
        let Some(setup) = &self.descriptor.script_setup else {
            return Ok(());
        };
        if setup.src().is_some() {
            return Err(SfcError::new(SfcErrorKind::SrcOnScriptSetup, setup.span));
        }
        if let Some(script) = &self.descriptor.script {
            if script.lang() != setup.lang() {
                return Err(SfcError::new(
                    SfcErrorKind::MismatchedLang {
                        script: script.lang().map(str::to_string),
                        setup: setup.lang().map(str::to_string),
                    },
                    setup.span,
                ));
            }
        }
        Ok(())
    }

    fn next(&self, tokens: &mut Peekable<Lexer<'src>>) -> Token {
        tokens.next().unwrap_or_else(|| {
            let end = Span::from_range(self.source.len()..self.source.len());
            Token {
                kind: TokenKind::Eof,
                span: end,
            }
        })
    }

    fn text(&self, span: Span) -> &'src str {
        &self.source[span.range()]
    }
}

fn unexpected(expected: &str, found: &Token) -> SfcError {
    SfcError::new(
        SfcErrorKind::UnexpectedToken {
            expected: expected.to_string(),
            found: found.kind.name().to_string(),
        },
        found.span,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Result<SfcDescriptor, SfcError> {
        Parser::new(source).parse()
    }

    #[test]
    fn test_blocks_and_attributes() {
        let source = "<template><div/></template>\n<script setup lang=\"ts\">\nconst a = 1;\n</script>\n<style scoped lang=scss>.a{}</style>\n";
        let descriptor = parse(source).unwrap();

        let template = descriptor.template.unwrap();
        assert_eq!(template.content, "<div/>");
        let setup = descriptor.script_setup.unwrap();
        assert!(setup.is_setup());
        assert_eq!(setup.lang(), Some("ts"));
        assert_eq!(setup.content, "\nconst a = 1;\n");
        assert_eq!(&source[setup.content_span.range()], setup.content);
        assert_eq!(descriptor.styles.len(), 1);
        assert_eq!(descriptor.styles[0].lang(), Some("scss"));
        assert!(descriptor.styles[0].has_attr("scoped"));
    }

    #[test]
    fn test_nested_templates() {
        let source = "<template><template v-if=\"a\"><b/></template><template #x /></template>";
        let template = parse(source).unwrap().template.unwrap();
        assert_eq!(
            template.content,
            "<template v-if=\"a\"><b/></template><template #x />"
        );
        assert_eq!(usize::from(template.span.end), source.len());
    }

    #[test]
    fn test_comments_and_custom_blocks() {
        let source = "<!-- <script>nope</script> -->\n<i18n lang=\"json\">{}</i18n>\n<docs/>";
        let descriptor = parse(source).unwrap();
        assert!(descriptor.is_script_less());
        let tags: Vec<&str> = descriptor
            .custom_blocks
            .iter()
            .map(|b| b.tag.as_str())
            .collect();
        assert_eq!(tags, vec!["i18n", "docs"]);
    }

    #[test]
    fn test_closing_tag_with_whitespace() {
        let descriptor = parse("<script>let a = '</scripts>';</script >").unwrap();
        assert_eq!(
            descriptor.script.unwrap().content,
            "let a = '</scripts>';"
        );
    }
}
