//! Font-face descriptors and their lookup keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use unicode_normalization::UnicodeNormalization;

/// A declared `@font-face` rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontFaceDescriptor {
    /// Font family name as declared
    pub family: String,

    /// Font weight (defaults to 400)
    #[serde(default)]
    pub weight: FontWeight,

    /// Font style (defaults to normal)
    #[serde(default)]
    pub style: FontStyle,

    /// Optional font stretch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stretch: Option<FontStretch>,

    /// Sources in declaration order; the first usable one wins
    #[serde(rename = "src", alias = "sources", default)]
    pub sources: Vec<FontSource>,
}

impl FontFaceDescriptor {
    /// Create a descriptor with default weight and style and no sources.
    pub fn new(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            weight: FontWeight::NORMAL,
            style: FontStyle::Normal,
            stretch: None,
            sources: Vec::new(),
        }
    }

    /// Set the weight.
    pub fn with_weight(mut self, weight: FontWeight) -> Self {
        self.weight = weight;
        self
    }

    /// Set the style.
    pub fn with_style(mut self, style: FontStyle) -> Self {
        self.style = style;
        self
    }

    /// Set the stretch.
    pub fn with_stretch(mut self, stretch: FontStretch) -> Self {
        self.stretch = Some(stretch);
        self
    }

    /// Append a source.
    pub fn with_source(mut self, url: impl Into<String>, format: Option<FontFormat>) -> Self {
        self.sources.push(FontSource {
            url: url.into(),
            format,
        });
        self
    }

    /// The identity key of this descriptor.
    pub fn key(&self) -> FontKey {
        FontKey::new(&self.family, self.weight, self.style, self.stretch)
    }
}

/// Identity of a font face: `(family, weight, style, stretch)`.
///
/// The family is stored normalized (quotes stripped, NFC, lowercase), so
/// `"Roboto"` and `'roboto'` name the same face.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FontKey {
    pub family: String,
    pub weight: FontWeight,
    pub style: FontStyle,
    pub stretch: Option<FontStretch>,
}

impl FontKey {
    /// Create a key, normalizing the family name.
    pub fn new(
        family: &str,
        weight: FontWeight,
        style: FontStyle,
        stretch: Option<FontStretch>,
    ) -> Self {
        Self {
            family: normalize_family(family),
            weight,
            style,
            stretch,
        }
    }
}

impl fmt::Display for FontKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.family, self.weight.0, self.style)?;
        if let Some(stretch) = self.stretch {
            write!(f, " {}", stretch)?;
        }
        Ok(())
    }
}

fn normalize_family(family: &str) -> String {
    family
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .nfc()
        .flat_map(char::to_lowercase)
        .collect()
}

/// Numeric font weight, 1 to 1000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "WeightRepr", into = "u16")]
pub struct FontWeight(pub u16);

impl FontWeight {
    pub const NORMAL: FontWeight = FontWeight(400);
    pub const BOLD: FontWeight = FontWeight(700);

    /// Create a weight, rejecting values outside 1..=1000.
    pub fn new(value: u16) -> Option<Self> {
        (1..=1000).contains(&value).then_some(Self(value))
    }
}

impl Default for FontWeight {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl From<u16> for FontWeight {
    fn from(value: u16) -> Self {
        Self(value.clamp(1, 1000))
    }
}

impl From<FontWeight> for u16 {
    fn from(weight: FontWeight) -> Self {
        weight.0
    }
}

impl FromStr for FontWeight {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::NORMAL),
            "bold" => Ok(Self::BOLD),
            other => other
                .parse::<u16>()
                .ok()
                .and_then(FontWeight::new)
                .ok_or_else(|| format!("Invalid font weight: {}", s)),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WeightRepr {
    Number(u16),
    Keyword(String),
}

impl TryFrom<WeightRepr> for FontWeight {
    type Error = String;

    fn try_from(repr: WeightRepr) -> Result<Self, Self::Error> {
        match repr {
            WeightRepr::Number(n) => {
                FontWeight::new(n).ok_or_else(|| format!("Font weight out of range: {}", n))
            }
            WeightRepr::Keyword(s) => s.parse(),
        }
    }
}

/// Font style.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

impl fmt::Display for FontStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FontStyle::Normal => "normal",
            FontStyle::Italic => "italic",
            FontStyle::Oblique => "oblique",
        };
        f.write_str(name)
    }
}

impl FromStr for FontStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(FontStyle::Normal),
            "italic" => Ok(FontStyle::Italic),
            "oblique" => Ok(FontStyle::Oblique),
            _ => Err(format!("Invalid font style: {}", s)),
        }
    }
}

/// CSS `font-stretch` keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontStretch {
    UltraCondensed,
    ExtraCondensed,
    Condensed,
    SemiCondensed,
    Normal,
    SemiExpanded,
    Expanded,
    ExtraExpanded,
    UltraExpanded,
}

impl FontStretch {
    const ALL: [(FontStretch, &'static str); 9] = [
        (FontStretch::UltraCondensed, "ultra-condensed"),
        (FontStretch::ExtraCondensed, "extra-condensed"),
        (FontStretch::Condensed, "condensed"),
        (FontStretch::SemiCondensed, "semi-condensed"),
        (FontStretch::Normal, "normal"),
        (FontStretch::SemiExpanded, "semi-expanded"),
        (FontStretch::Expanded, "expanded"),
        (FontStretch::ExtraExpanded, "extra-expanded"),
        (FontStretch::UltraExpanded, "ultra-expanded"),
    ];

    /// The CSS keyword.
    pub fn as_str(&self) -> &'static str {
        Self::ALL
            .iter()
            .find(|(stretch, _)| stretch == self)
            .map(|(_, name)| *name)
            .unwrap_or("normal")
    }
}

impl fmt::Display for FontStretch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FontStretch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .find(|(_, name)| *name == needle)
            .map(|(stretch, _)| *stretch)
            .ok_or_else(|| format!("Invalid font stretch: {}", s))
    }
}

/// One `src` entry of a font face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSource {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<FontFormat>,
}

impl FontSource {
    /// Declared format, or the one implied by the URL extension.
    pub fn effective_format(&self) -> FontFormat {
        self.format
            .clone()
            .unwrap_or_else(|| FontFormat::from_url(&self.url))
    }
}

/// Font container formats named in `format(...)` hints.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FontFormat {
    TrueType,
    OpenType,
    Woff,
    Woff2,
    EmbeddedOpenType,
    Svg,
    Other(String),
}

impl FontFormat {
    /// Guess the format from a URL's file extension.
    pub fn from_url(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let ext = path.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
        match ext.as_str() {
            "ttf" => FontFormat::TrueType,
            "otf" => FontFormat::OpenType,
            "woff" => FontFormat::Woff,
            "woff2" => FontFormat::Woff2,
            "eot" => FontFormat::EmbeddedOpenType,
            "svg" => FontFormat::Svg,
            _ => FontFormat::Other(ext),
        }
    }

    /// The `format()` keyword.
    pub fn as_str(&self) -> &str {
        match self {
            FontFormat::TrueType => "truetype",
            FontFormat::OpenType => "opentype",
            FontFormat::Woff => "woff",
            FontFormat::Woff2 => "woff2",
            FontFormat::EmbeddedOpenType => "embedded-opentype",
            FontFormat::Svg => "svg",
            FontFormat::Other(s) => s,
        }
    }

    /// Whether the font subsystem can consume this format.
    pub fn is_supported(&self) -> bool {
        matches!(
            self,
            FontFormat::TrueType | FontFormat::OpenType | FontFormat::Woff | FontFormat::Woff2
        )
    }
}

impl From<String> for FontFormat {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "truetype" | "ttf" => FontFormat::TrueType,
            "opentype" | "otf" => FontFormat::OpenType,
            "woff" => FontFormat::Woff,
            "woff2" => FontFormat::Woff2,
            "embedded-opentype" | "eot" => FontFormat::EmbeddedOpenType,
            "svg" => FontFormat::Svg,
            other => FontFormat::Other(other.to_string()),
        }
    }
}

impl From<FontFormat> for String {
    fn from(format: FontFormat) -> Self {
        format.as_str().to_string()
    }
}

impl Serialize for FontFormat {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FontFormat {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(FontFormat::from)
    }
}
