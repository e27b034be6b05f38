//! Highlight attributes and their lookup table.
//!
//! The editor assigns small integer ids to combinations of colours and style
//! flags, announces them with `hl_attr_define`, and then refers to them from
//! every grid cell. Id `0` always means "default colours".

use std::collections::HashMap;
use std::fmt;

use bitflags::bitflags;
use quill_rpc::Value;

/// A 24-bit RGB colour as sent by the editor (`0xRRGGBB`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(u32);

impl Rgb {
    /// Builds a colour from a packed `0xRRGGBB` value; higher bits are masked.
    #[must_use]
    pub const fn new(packed: u32) -> Self {
        Self(packed & 0x00ff_ffff)
    }

    /// Reads a colour from the wire. Negative numbers mean "unset".
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        value
            .as_i64()
            .and_then(|raw| u32::try_from(raw).ok())
            .map(Self::new)
    }

    /// The packed `0xRRGGBB` value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

bitflags! {
    /// Text styles carried by a highlight attribute.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StyleFlags: u8 {
        /// `bold`
        const BOLD          = 1 << 0;
        /// `italic`
        const ITALIC        = 1 << 1;
        /// `underline`
        const UNDERLINE     = 1 << 2;
        /// `undercurl`
        const UNDERCURL     = 1 << 3;
        /// `strikethrough`
        const STRIKETHROUGH = 1 << 4;
        /// `reverse`: swap foreground and background.
        const REVERSE       = 1 << 5;
    }
}

const STYLE_KEYS: [(&str, StyleFlags); 6] = [
    ("bold", StyleFlags::BOLD),
    ("italic", StyleFlags::ITALIC),
    ("underline", StyleFlags::UNDERLINE),
    ("undercurl", StyleFlags::UNDERCURL),
    ("strikethrough", StyleFlags::STRIKETHROUGH),
    ("reverse", StyleFlags::REVERSE),
];

/// One entry of the highlight table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HighlightAttribute {
    /// Id assigned by the editor.
    pub id: u64,
    /// Foreground colour; `None` falls back to the default.
    pub foreground: Option<Rgb>,
    /// Background colour; `None` falls back to the default.
    pub background: Option<Rgb>,
    /// Underline and undercurl colour; `None` falls back to the default.
    pub special: Option<Rgb>,
    /// Style flags.
    pub style: StyleFlags,
    /// Highlight group that produced this attribute, when reported.
    pub group: Option<String>,
}

impl HighlightAttribute {
    /// Builds an attribute from the `rgb_attrs` map and `info` array of an
    /// `hl_attr_define` event.
    ///
    /// Unknown keys are ignored. The group name comes from the last `info`
    /// entry, which describes the outermost group.
    #[must_use]
    pub fn from_definition(id: u64, rgb_attrs: &Value, info: Option<&Value>) -> Self {
        let style = STYLE_KEYS
            .iter()
            .filter(|(key, _)| rgb_attrs.get(key).and_then(Value::as_bool) == Some(true))
            .fold(StyleFlags::empty(), |style, (_, flag)| style | *flag);
        let group = info
            .and_then(Value::as_array)
            .and_then(<[Value]>::last)
            .and_then(|entry| entry.get("hi_name"))
            .and_then(Value::as_str)
            .map(str::to_owned);

        Self {
            id,
            foreground: rgb_attrs.get("foreground").and_then(Rgb::from_value),
            background: rgb_attrs.get("background").and_then(Rgb::from_value),
            special: rgb_attrs.get("special").and_then(Rgb::from_value),
            style,
            group,
        }
    }
}

/// Colours used for id `0` and for attributes that leave a colour unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultColors {
    /// Default foreground.
    pub foreground: Rgb,
    /// Default background.
    pub background: Rgb,
    /// Default special colour.
    pub special: Rgb,
}

impl Default for DefaultColors {
    fn default() -> Self {
        Self {
            foreground: Rgb::new(0x00ff_ffff),
            background: Rgb::new(0x0000_0000),
            special: Rgb::new(0x00ff_0000),
        }
    }
}

/// Highlight ids known to the UI, plus the group-name index.
#[derive(Debug, Clone, Default)]
pub struct HighlightTable {
    attributes: HashMap<u64, HighlightAttribute>,
    groups: HashMap<String, u64>,
    defaults: DefaultColors,
}

impl HighlightTable {
    /// Creates an empty table with built-in default colours.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines or replaces the attribute with `attribute.id`.
    pub fn define(&mut self, attribute: HighlightAttribute) {
        self.attributes.insert(attribute.id, attribute);
    }

    /// Looks up an attribute by id.
    #[must_use]
    pub fn get(&self, id: u64) -> Option<&HighlightAttribute> {
        self.attributes.get(&id)
    }

    /// Number of defined attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Returns `true` when no attribute has been defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Records that the UI group `name` is drawn with highlight `id`.
    pub fn set_group(&mut self, name: impl Into<String>, id: u64) {
        self.groups.insert(name.into(), id);
    }

    /// Highlight id used for the UI group `name`.
    #[must_use]
    pub fn group(&self, name: &str) -> Option<u64> {
        self.groups.get(name).copied()
    }

    /// Current default colours.
    #[must_use]
    pub const fn defaults(&self) -> DefaultColors {
        self.defaults
    }

    /// Replaces the default colours.
    pub const fn set_defaults(&mut self, defaults: DefaultColors) {
        self.defaults = defaults;
    }

    /// Effective foreground for cells drawn with `id`.
    #[must_use]
    pub fn foreground(&self, id: u64) -> Rgb {
        let attribute = self.get(id);
        if is_reversed(attribute) {
            self.raw_background(attribute)
        } else {
            self.raw_foreground(attribute)
        }
    }

    /// Effective background for cells drawn with `id`.
    #[must_use]
    pub fn background(&self, id: u64) -> Rgb {
        let attribute = self.get(id);
        if is_reversed(attribute) {
            self.raw_foreground(attribute)
        } else {
            self.raw_background(attribute)
        }
    }

    /// Effective special colour for cells drawn with `id`.
    #[must_use]
    pub fn special(&self, id: u64) -> Rgb {
        self.get(id)
            .and_then(|attribute| attribute.special)
            .unwrap_or(self.defaults.special)
    }

    fn raw_foreground(&self, attribute: Option<&HighlightAttribute>) -> Rgb {
        attribute
            .and_then(|attr| attr.foreground)
            .unwrap_or(self.defaults.foreground)
    }

    fn raw_background(&self, attribute: Option<&HighlightAttribute>) -> Rgb {
        attribute
            .and_then(|attr| attr.background)
            .unwrap_or(self.defaults.background)
    }
}

fn is_reversed(attribute: Option<&HighlightAttribute>) -> bool {
    attribute.is_some_and(|attr| attr.style.contains(StyleFlags::REVERSE))
}
