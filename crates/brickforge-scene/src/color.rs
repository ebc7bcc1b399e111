//! LDraw color table
//!
//! Color codes map to a name (used as the material name) and an RGB value.
//! The table comes from the library's `LDConfig.ldr` when one is available and
//! falls back to the common solid and transparent colors otherwise.

use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Inherit the color of the referencing line
pub const MAIN_COLOR: u32 = 16;
/// Inherit the edge color of the referencing line
pub const EDGE_COLOR: u32 = 24;

/// One named color
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdrawColor {
    pub code: u32,
    pub name: String,
    pub rgb: [u8; 3],
    pub edge: [u8; 3],
}

const BUILTIN: &[(u32, &str, u32, u32)] = &[
    (0, "Black", 0x1B2A34, 0x808080),
    (1, "Blue", 0x1E5AA8, 0x333333),
    (2, "Green", 0x00852B, 0x333333),
    (3, "Dark_Turquoise", 0x069D9F, 0x333333),
    (4, "Red", 0xB40000, 0x333333),
    (5, "Dark_Pink", 0xD3359D, 0x333333),
    (6, "Brown", 0x543324, 0x1E1E1E),
    (7, "Light_Grey", 0x8A928D, 0x333333),
    (8, "Dark_Grey", 0x545955, 0x333333),
    (9, "Light_Blue", 0x97CBD9, 0x333333),
    (10, "Bright_Green", 0x58AB41, 0x333333),
    (11, "Light_Turquoise", 0x00AAA4, 0x333333),
    (12, "Salmon", 0xF06D61, 0x333333),
    (13, "Pink", 0xF6A9BB, 0x333333),
    (14, "Yellow", 0xFAC80A, 0x333333),
    (15, "White", 0xF4F4F4, 0x808080),
    (17, "Light_Green", 0xADD9A8, 0x333333),
    (18, "Light_Yellow", 0xFFD67F, 0x333333),
    (19, "Tan", 0xD7BA8C, 0x333333),
    (20, "Light_Violet", 0xAFBED6, 0x333333),
    (22, "Purple", 0x671F81, 0x333333),
    (25, "Orange", 0xD67923, 0x333333),
    (26, "Magenta", 0x901F76, 0x333333),
    (27, "Lime", 0xA5CA18, 0x333333),
    (28, "Dark_Tan", 0x897D62, 0x333333),
    (33, "Trans_Dark_Blue", 0x0020A0, 0x000064),
    (34, "Trans_Green", 0x237841, 0x184632),
    (36, "Trans_Red", 0xC91A09, 0x880000),
    (40, "Trans_Black", 0x635F52, 0x171316),
    (41, "Trans_Medium_Blue", 0xAEEFEC, 0x63B2B8),
    (43, "Trans_Light_Blue", 0xC1DFF0, 0x8EB3CC),
    (46, "Trans_Yellow", 0xF5CD2F, 0x8E7400),
    (47, "Trans_Clear", 0xFCFCFC, 0xC3C3C3),
    (70, "Reddish_Brown", 0x5F3109, 0x333333),
    (71, "Light_Bluish_Grey", 0x969696, 0x333333),
    (72, "Dark_Bluish_Grey", 0x646464, 0x333333),
    (84, "Medium_Nougat", 0xAA7D55, 0x333333),
    (85, "Dark_Purple", 0x3F3691, 0x1E1E1E),
    (272, "Dark_Blue", 0x0A3463, 0x1E1E1E),
    (288, "Dark_Green", 0x184632, 0x1E1E1E),
    (308, "Dark_Brown", 0x352100, 0x1E1E1E),
    (320, "Dark_Red", 0x720E0F, 0x333333),
    (326, "Yellowish_Green", 0xDFEEA5, 0x333333),
    (378, "Sand_Green", 0xA0BCAC, 0x333333),
    (379, "Sand_Blue", 0x6A7A96, 0x333333),
];

fn rgb(hex: u32) -> [u8; 3] {
    [(hex >> 16) as u8, (hex >> 8) as u8, hex as u8]
}

/// Code to color lookup
#[derive(Debug, Clone)]
pub struct ColorTable {
    colors: HashMap<u32, LdrawColor>,
}

impl Default for ColorTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ColorTable {
    pub fn builtin() -> Self {
        let colors = BUILTIN
            .iter()
            .map(|&(code, name, value, edge)| {
                (
                    code,
                    LdrawColor {
                        code,
                        name: name.to_string(),
                        rgb: rgb(value),
                        edge: rgb(edge),
                    },
                )
            })
            .collect();
        Self { colors }
    }

    /// Parse `!COLOUR` lines; codes missing from the text keep their builtin value
    pub fn parse_ldconfig(text: &str) -> Self {
        static COLOUR: OnceLock<Regex> = OnceLock::new();
        let regex = COLOUR.get_or_init(|| {
            Regex::new(
                r"(?i)^\s*0\s+!COLOUR\s+(\S+)\s+CODE\s+(\d+)\s+VALUE\s+#([0-9a-f]{6})\s+EDGE\s+#([0-9a-f]{6})",
            )
            .expect("invalid regex pattern")
        });

        let mut table = Self::builtin();
        for caps in text.lines().filter_map(|line| regex.captures(line)) {
            let (Ok(code), Ok(value), Ok(edge)) = (
                caps[2].parse::<u32>(),
                u32::from_str_radix(&caps[3], 16),
                u32::from_str_radix(&caps[4], 16),
            ) else {
                continue;
            };
            table.colors.insert(
                code,
                LdrawColor {
                    code,
                    name: caps[1].to_string(),
                    rgb: rgb(value),
                    edge: rgb(edge),
                },
            );
        }
        table
    }

    /// Load `LDConfig.ldr` from a library root, or the builtin table
    pub fn load(library: Option<&Path>) -> Self {
        let Some(path) = library.map(|root| root.join("LDConfig.ldr")) else {
            return Self::builtin();
        };
        if !path.is_file() {
            debug!("No LDConfig.ldr in library, using builtin colors");
            return Self::builtin();
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => Self::parse_ldconfig(&text),
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                Self::builtin()
            }
        }
    }

    pub fn get(&self, code: u32) -> Option<&LdrawColor> {
        self.colors.get(&code)
    }

    /// Material name for a code; direct colors (`0x2RRGGBB`) and unknown codes
    /// get a synthetic name
    pub fn name(&self, code: u32) -> String {
        match self.get(code) {
            Some(color) => color.name.clone(),
            None if is_direct(code) => format!("Direct_{:06X}", code & 0xFF_FFFF),
            None => format!("Color_{}", code),
        }
    }

    pub fn rgb(&self, code: u32) -> [u8; 3] {
        match self.get(code) {
            Some(color) => color.rgb,
            None if is_direct(code) => rgb(code & 0xFF_FFFF),
            None => [0x80, 0x80, 0x80],
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

fn is_direct(code: u32) -> bool {
    code >> 24 == 2
}

/// Resolve a line's color against the color it inherits
pub fn resolve(code: u32, inherited: u32) -> u32 {
    match code {
        MAIN_COLOR | EDGE_COLOR => inherited,
        other => other,
    }
}
