// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! In-memory PO catalog: unit insertion, header notes, duplicate
//! resolution, and serialization.
//!
//! `polib` supplies the message and metadata model, but its `Catalog`
//! keys messages eagerly and has no place for developer comments on the
//! header entry. The store here keeps its own ordered message list, so
//! colliding entries can coexist until a duplicate-resolution pass, and
//! writes the PO syntax itself.

use std::collections::{HashMap, HashSet};
use std::io::{self, Write};

use chrono::SecondsFormat;
use polib::message::{Message, MessageView};
use polib::metadata::CatalogMetadata;

/// Policy for resolving entries that would share a PO key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum DuplicateStyle {
    /// Disambiguate colliding entries with a `msgctxt`.
    #[default]
    Msgctxt,
    /// Fold colliding entries into the first occurrence.
    Merge,
}

/// A PO catalog under construction.
///
/// Messages keep their insertion order; the header entry is synthesized
/// from `metadata` and `header_comments` at serialization time.
pub struct PoFile {
    pub metadata: CatalogMetadata,
    header_comments: Vec<String>,
    messages: Vec<Message>,
}

impl PoFile {
    pub fn new() -> Self {
        let mut metadata = CatalogMetadata::new();
        let now = chrono::Local::now();
        metadata.pot_creation_date = now.to_rfc3339_opts(SecondsFormat::Secs, true);
        metadata.mime_version = String::from("1.0");
        metadata.content_type = String::from("text/plain; charset=UTF-8");
        metadata.content_transfer_encoding = String::from("8bit");
        PoFile {
            metadata,
            header_comments: Vec::new(),
            messages: Vec::new(),
        }
    }

    /// Append a unit, preserving insertion order. Entries with colliding
    /// keys are accepted here; [`PoFile::remove_duplicates`] resolves
    /// them.
    pub fn add_unit(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Attach one developer note to the header entry.
    pub fn add_header_note(&mut self, note: &str) {
        self.header_comments.push(note.to_owned());
    }

    pub fn header_notes(&self) -> &[String] {
        &self.header_comments
    }

    /// True when the catalog holds no units besides the header.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Resolve entries sharing a `(msgctxt, msgid)` key according to
    /// `style`. The header never participates.
    pub fn remove_duplicates(&mut self, style: DuplicateStyle) {
        match style {
            DuplicateStyle::Merge => self.merge_duplicates(),
            DuplicateStyle::Msgctxt => {
                self.add_duplicate_contexts();
                // Colliding entries with the same locations receive the
                // same context; fold whatever is left.
                self.merge_duplicates();
            }
        }
    }

    /// Give every message whose `msgid` occurs more than once a
    /// disambiguating `msgctxt`: its locations joined with a space, or
    /// its occurrence ordinal when it has no locations.
    fn add_duplicate_contexts(&mut self) {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for message in &self.messages {
            *counts.entry(message.msgid().to_owned()).or_insert(0) += 1;
        }

        let mut ordinal: HashMap<String, usize> = HashMap::new();
        let messages = std::mem::take(&mut self.messages);
        self.messages = messages
            .into_iter()
            .map(|message| {
                let seen = ordinal.entry(message.msgid().to_owned()).or_insert(0);
                *seen += 1;
                if counts[message.msgid()] < 2 || !message.msgctxt().is_empty() {
                    return message;
                }
                let context = if message.source().is_empty() {
                    seen.to_string()
                } else {
                    message.source().split('\n').collect::<Vec<_>>().join(" ")
                };
                with_msgctxt(&message, context)
            })
            .collect();
    }

    fn merge_duplicates(&mut self) {
        let mut index: HashMap<(String, String), usize> = HashMap::new();
        let mut kept: Vec<Message> = Vec::new();
        for message in self.messages.drain(..) {
            let key = (message.msgctxt().to_owned(), message.msgid().to_owned());
            match index.get(&key) {
                Some(&at) => {
                    let merged = merge_pair(&kept[at], &message);
                    kept[at] = merged;
                }
                None => {
                    index.insert(key, kept.len());
                    kept.push(message);
                }
            }
        }
        self.messages = kept;
    }

    /// Write the catalog as PO text. Output is always UTF-8.
    pub fn serialize(&self, out: &mut impl Write) -> io::Result<()> {
        for note in &self.header_comments {
            write_comments(out, note)?;
        }
        write_field(out, "msgid", "")?;
        write_field(out, "msgstr", &self.header_msgstr())?;
        for message in &self.messages {
            writeln!(out)?;
            write_comments(out, message.comments())?;
            for location in message.source().lines() {
                writeln!(out, "#: {location}")?;
            }
            if !message.msgctxt().is_empty() {
                write_field(out, "msgctxt", message.msgctxt())?;
            }
            write_field(out, "msgid", message.msgid())?;
            write_field(out, "msgstr", message.msgstr().unwrap_or_default())?;
        }
        Ok(())
    }

    fn header_msgstr(&self) -> String {
        let m = &self.metadata;
        let fields = [
            ("Project-Id-Version", &m.project_id_version),
            ("POT-Creation-Date", &m.pot_creation_date),
            ("PO-Revision-Date", &m.po_revision_date),
            ("Last-Translator", &m.last_translator),
            ("Language-Team", &m.language_team),
            ("Language", &m.language),
            ("MIME-Version", &m.mime_version),
            ("Content-Type", &m.content_type),
            ("Content-Transfer-Encoding", &m.content_transfer_encoding),
        ];
        let mut header = String::new();
        for (name, value) in fields {
            if !value.is_empty() {
                header.push_str(name);
                header.push_str(": ");
                header.push_str(value);
                header.push('\n');
            }
        }
        header
    }
}

impl Default for PoFile {
    fn default() -> Self {
        Self::new()
    }
}

/// Rebuild `message` with `context` as its `msgctxt`.
fn with_msgctxt(message: &Message, context: String) -> Message {
    Message::build_singular()
        .with_msgctxt(context)
        .with_msgid(message.msgid().to_owned())
        .with_msgstr(message.msgstr().unwrap_or_default().to_owned())
        .with_source(message.source().to_owned())
        .with_comments(message.comments().to_owned())
        .done()
}

/// Fold `second` into `first`: locations concatenate without repeats,
/// distinct notes append, and the first non-empty translation wins.
fn merge_pair(first: &Message, second: &Message) -> Message {
    let mut seen = HashSet::new();
    let locations = first
        .source()
        .lines()
        .chain(second.source().lines())
        .filter(|location| seen.insert(*location))
        .collect::<Vec<_>>()
        .join("\n");

    let mut seen_notes = HashSet::new();
    let comments = first
        .comments()
        .lines()
        .chain(second.comments().lines())
        .filter(|line| seen_notes.insert(*line))
        .collect::<Vec<_>>()
        .join("\n");

    let msgstr = if first.msgstr().unwrap_or_default().is_empty() {
        second.msgstr().unwrap_or_default()
    } else {
        first.msgstr().unwrap_or_default()
    };

    Message::build_singular()
        .with_msgctxt(first.msgctxt().to_owned())
        .with_msgid(first.msgid().to_owned())
        .with_msgstr(msgstr.to_owned())
        .with_source(locations)
        .with_comments(comments)
        .done()
}

/// Write `text` as `#.` developer comment lines, one per line of text.
fn write_comments(out: &mut impl Write, text: &str) -> io::Result<()> {
    for line in text.lines() {
        if line.is_empty() {
            writeln!(out, "#.")?;
        } else {
            writeln!(out, "#. {line}")?;
        }
    }
    Ok(())
}

/// Write one `keyword "value"` field, using the continuation-line form
/// for values with embedded newlines.
fn write_field(out: &mut impl Write, keyword: &str, value: &str) -> io::Result<()> {
    if value.contains('\n') {
        writeln!(out, "{keyword} \"\"")?;
        for chunk in value.split_inclusive('\n') {
            writeln!(out, "\"{}\"", escape(chunk))?;
        }
    } else {
        writeln!(out, "{keyword} \"{}\"", escape(value))?;
    }
    Ok(())
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use polib::po_file;
    use pretty_assertions::assert_eq;

    fn message(msgid: &str, msgstr: &str, source: &str, comments: &str) -> Message {
        Message::build_singular()
            .with_msgid(String::from(msgid))
            .with_msgstr(String::from(msgstr))
            .with_source(String::from(source))
            .with_comments(String::from(comments))
            .done()
    }

    /// A catalog with a fixed creation date, so output is deterministic.
    fn po_file_for_tests() -> PoFile {
        let mut catalog = PoFile::new();
        catalog.metadata.pot_creation_date = String::from("2024-01-01T00:00:00Z");
        catalog
    }

    #[test]
    fn test_new_catalog_metadata() {
        let catalog = PoFile::new();
        assert!(!catalog.metadata.pot_creation_date.is_empty());
        assert_eq!(catalog.metadata.mime_version, "1.0");
        assert_eq!(catalog.metadata.content_type, "text/plain; charset=UTF-8");
        assert_eq!(catalog.metadata.content_transfer_encoding, "8bit");
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_serialize_single_message() {
        let mut catalog = po_file_for_tests();
        catalog.add_header_note("extracted from menu.lang");
        catalog.add_unit(message("File", "Datei", "menu.lang:12", "menu label"));

        let mut out = Vec::new();
        catalog.serialize(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "#. extracted from menu.lang\n\
             msgid \"\"\n\
             msgstr \"\"\n\
             \"POT-Creation-Date: 2024-01-01T00:00:00Z\\n\"\n\
             \"MIME-Version: 1.0\\n\"\n\
             \"Content-Type: text/plain; charset=UTF-8\\n\"\n\
             \"Content-Transfer-Encoding: 8bit\\n\"\n\
             \n\
             #. menu label\n\
             #: menu.lang:12\n\
             msgid \"File\"\n\
             msgstr \"Datei\"\n"
        );
    }

    #[test]
    fn test_serialize_escapes_special_characters() {
        let mut catalog = po_file_for_tests();
        catalog.add_unit(message("Say \"hi\"\\now", "first\nsecond", "", ""));

        let mut out = Vec::new();
        catalog.serialize(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("msgid \"Say \\\"hi\\\"\\\\now\"\n"));
        assert!(text.contains("msgstr \"\"\n\"first\\n\"\n\"second\"\n"));
    }

    #[test]
    fn test_serialized_output_reparses_with_polib() -> anyhow::Result<()> {
        let mut catalog = po_file_for_tests();
        catalog.add_header_note("extracted from menu.lang");
        catalog.add_unit(message("File", "Datei", "menu.lang:12", "menu label"));
        catalog.add_unit(message("Edit", "Bearbeiten", "", ""));

        let tmpdir = tempfile::tempdir()?;
        let path = tmpdir.path().join("menu.po");
        let mut out = std::fs::File::create(&path)?;
        catalog.serialize(&mut out)?;
        drop(out);

        let parsed = po_file::parse(&path)?;
        assert_eq!(
            parsed.messages().map(|msg| msg.msgid()).collect::<Vec<_>>(),
            &["File", "Edit"]
        );
        assert_eq!(parsed.metadata.content_transfer_encoding, "8bit");
        Ok(())
    }

    #[test]
    fn test_msgctxt_style_disambiguates_by_location() {
        let mut catalog = po_file_for_tests();
        catalog.add_unit(message("Hello", "Bonjour", "a.lang:1", ""));
        catalog.add_unit(message("Hello", "Salut", "b.lang:9", ""));
        catalog.add_unit(message("Bye", "Au revoir", "a.lang:2", ""));

        catalog.remove_duplicates(DuplicateStyle::Msgctxt);
        let contexts = catalog
            .messages()
            .map(|msg| (msg.msgctxt(), msg.msgid()))
            .collect::<Vec<_>>();
        assert_eq!(
            contexts,
            &[("a.lang:1", "Hello"), ("b.lang:9", "Hello"), ("", "Bye")]
        );
    }

    #[test]
    fn test_msgctxt_style_falls_back_to_ordinals() {
        let mut catalog = po_file_for_tests();
        catalog.add_unit(message("Hello", "Bonjour", "", ""));
        catalog.add_unit(message("Hello", "Salut", "", ""));

        catalog.remove_duplicates(DuplicateStyle::Msgctxt);
        let contexts = catalog
            .messages()
            .map(|msg| msg.msgctxt())
            .collect::<Vec<_>>();
        assert_eq!(contexts, &["1", "2"]);
    }

    #[test]
    fn test_msgctxt_style_folds_identical_entries() {
        let mut catalog = po_file_for_tests();
        catalog.add_unit(message("Hello", "Bonjour", "a.lang:1", ""));
        catalog.add_unit(message("Hello", "", "a.lang:1", ""));

        catalog.remove_duplicates(DuplicateStyle::Msgctxt);
        assert_eq!(catalog.messages().count(), 1);
    }

    #[test]
    fn test_no_two_messages_share_a_key() {
        let mut catalog = po_file_for_tests();
        catalog.add_unit(message("Hello", "Bonjour", "a.lang:1", ""));
        catalog.add_unit(message("Hello", "Salut", "b.lang:9", ""));
        catalog.add_unit(message("Hello", "Hej", "", ""));

        catalog.remove_duplicates(DuplicateStyle::Msgctxt);
        let keys = catalog
            .messages()
            .map(|msg| (msg.msgctxt().to_owned(), msg.msgid().to_owned()))
            .collect::<Vec<_>>();
        let unique = keys.iter().collect::<HashSet<_>>();
        assert_eq!(unique.len(), keys.len());
    }

    #[test]
    fn test_merge_style_concatenates_locations() {
        let mut catalog = po_file_for_tests();
        catalog.add_unit(message("Hello", "", "a.lang:1", "first note"));
        catalog.add_unit(message("Hello", "Bonjour", "b.lang:9", "second note"));
        catalog.add_unit(message("Hello", "Salut", "a.lang:1", "first note"));

        catalog.remove_duplicates(DuplicateStyle::Merge);
        assert_eq!(catalog.messages().count(), 1);
        let merged = catalog.messages().next().unwrap();
        assert_eq!(merged.source(), "a.lang:1\nb.lang:9");
        assert_eq!(merged.comments(), "first note\nsecond note");
        // The first non-empty translation wins.
        assert_eq!(merged.msgstr().unwrap(), "Bonjour");
    }

    #[test]
    fn test_merge_style_keeps_order_of_first_occurrence() {
        let mut catalog = po_file_for_tests();
        catalog.add_unit(message("One", "", "", ""));
        catalog.add_unit(message("Two", "", "", ""));
        catalog.add_unit(message("One", "", "", ""));

        catalog.remove_duplicates(DuplicateStyle::Merge);
        let msgids = catalog.messages().map(|msg| msg.msgid()).collect::<Vec<_>>();
        assert_eq!(msgids, &["One", "Two"]);
    }
}
