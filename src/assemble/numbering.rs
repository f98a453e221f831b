//! List numbering definitions
//!
//! Every list in the output shares two numbering instances: one bulleted,
//! one decimal. Nesting depth selects the level within the instance.
//! docx-rs always writes its own definition under id 1, so ours start at 2.

use docx_rs::*;

use crate::template::TWIPS_PER_CHAR;

pub(crate) const BULLET_NUMBERING_ID: usize = 2;
pub(crate) const DECIMAL_NUMBERING_ID: usize = 3;
pub(crate) const MAX_LEVEL: u8 = 8;

const BULLET_SYMBOLS: [&str; 3] = ["•", "○", "▪"];

/// Numbering instance for a list kind
pub(crate) fn numbering_id(ordered: bool) -> usize {
    if ordered {
        DECIMAL_NUMBERING_ID
    } else {
        BULLET_NUMBERING_ID
    }
}

/// Level index for a nesting depth, clamped to the nine levels Word supports
pub(crate) fn level_index(depth: u8) -> usize {
    depth.min(MAX_LEVEL) as usize
}

fn list_level(level: usize, format: &str, text: &str) -> Level {
    let step = TWIPS_PER_CHAR as i32;
    Level::new(
        level,
        Start::new(1),
        NumberFormat::new(format),
        LevelText::new(text),
        LevelJc::new("left"),
    )
    .indent(
        Some(step * (level as i32 + 1)),
        Some(SpecialIndentType::Hanging(step)),
        None,
        None,
    )
}

/// Register the bullet and decimal numbering definitions on `docx`
pub(crate) fn install(docx: Docx) -> Docx {
    let mut bullets = AbstractNumbering::new(BULLET_NUMBERING_ID);
    let mut decimals = AbstractNumbering::new(DECIMAL_NUMBERING_ID);

    for level in 0..=MAX_LEVEL as usize {
        let symbol = BULLET_SYMBOLS[level % BULLET_SYMBOLS.len()];
        bullets = bullets.add_level(list_level(level, "bullet", symbol));
        decimals = decimals.add_level(list_level(level, "decimal", &format!("%{}.", level + 1)));
    }

    docx.add_abstract_numbering(bullets)
        .add_abstract_numbering(decimals)
        .add_numbering(Numbering::new(BULLET_NUMBERING_ID, BULLET_NUMBERING_ID))
        .add_numbering(Numbering::new(DECIMAL_NUMBERING_ID, DECIMAL_NUMBERING_ID))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbering_ids() {
        assert_eq!(numbering_id(false), 2);
        assert_eq!(numbering_id(true), 3);
    }

    #[test]
    fn test_level_index_clamps() {
        assert_eq!(level_index(0), 0);
        assert_eq!(level_index(3), 3);
        assert_eq!(level_index(20), 8);
    }

    #[test]
    fn test_level_indent_steps_by_character_width() {
        // 420 twips per character, one step per level
        assert_eq!(TWIPS_PER_CHAR as i32, 420);
        let docx = install(Docx::new());
        assert_eq!(docx.numberings.abstract_nums.len(), 2);
        assert_eq!(docx.numberings.numberings.len(), 2);
    }
}
