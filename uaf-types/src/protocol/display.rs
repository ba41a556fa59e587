use serde::{Deserialize, Serialize};
use typeshare::typeshare;

/// Characteristics of the PNG images an authenticator with a transaction display can show.
///
/// <https://fidoalliance.org/specs/fido-uaf-v1.1-ps-20170202/fido-metadata-statement-v1.1-ps-20170202.html#displaypngcharacteristicsdescriptor-dictionary>
#[typeshare]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayPngCharacteristics {
    /// Image width.
    pub width: u32,
    /// Image height.
    pub height: u32,
    /// Bit depth, bits per sample or per palette index.
    pub bit_depth: u8,
    /// Color type defines the PNG image type.
    pub color_type: u8,
    /// Compression method.
    pub compression: u8,
    /// Filter method.
    pub filter: u8,
    /// Interlace method.
    pub interlace: u8,
    /// Palette, 1 to 256 entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plte: Option<Vec<RgbPaletteEntry>>,
}

/// A palette entry of a [`DisplayPngCharacteristics`].
#[typeshare]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RgbPaletteEntry {
    /// Red channel.
    pub r: u16,
    /// Green channel.
    pub g: u16,
    /// Blue channel.
    pub b: u16,
}
