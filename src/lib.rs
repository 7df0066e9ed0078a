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

//! Convert Mozilla `.lang` localization files to Gettext PO catalogs.
//!
//! The crate is split along the seams of the conversion pipeline: the
//! [`lang`] module parses a `.lang` file into translation units, the
//! [`catalog`] module owns the PO catalog being built (unit insertion,
//! header notes, duplicate resolution, serialization), and [`convert`]
//! maps one store onto the other. The `lang2po` binary wires the
//! pipeline to the filesystem.

pub mod catalog;
pub mod convert;
pub mod lang;

/// One translatable entry, independent of any file format.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransUnit {
    /// Source-language text.
    pub source: String,
    /// Translated text, empty when untranslated.
    pub target: String,
    /// `file:line` references, in the order they were found.
    pub locations: Vec<String>,
    /// Developer notes for this entry, empty when there are none.
    pub notes: String,
}

/// A parsed source of translation units.
///
/// The converter only consumes this surface, so an alternate input format
/// can be substituted without touching the conversion logic.
pub trait SourceStore {
    /// Name of the file the units were read from.
    fn filename(&self) -> &str;

    /// All units, in file order.
    fn units(&self) -> &[TransUnit];
}
