//! Répartition du texte réglementaire sur deux colonnes

/// Hauteur estimée d'un paragraphe
///
/// Chaque ligne source compte pour ⌊largeur / largeur de colonne⌋ + 1 lignes,
/// une ligne vide pour une.
pub fn estimated_height(
    paragraph: &str,
    column_width: f32,
    line_height: f32,
    measure: impl Fn(&str) -> f32,
) -> f32 {
    paragraph
        .split('\n')
        .map(|line| {
            if line.trim().is_empty() {
                line_height
            } else {
                let lines = (measure(line) / column_width).floor().max(0.0) + 1.0;
                lines * line_height
            }
        })
        .sum()
}

/// Indices des paragraphes de chaque colonne, dans l'ordre d'origine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Columns {
    pub left: Vec<usize>,
    pub right: Vec<usize>,
    pub left_height: f32,
    pub right_height: f32,
}

/// Placement glouton: chaque paragraphe va dans la colonne la moins haute
/// (égalité: colonne de gauche)
pub fn balance(
    paragraphs: &[String],
    column_width: f32,
    line_height: f32,
    measure: impl Fn(&str) -> f32,
) -> Columns {
    let mut columns = Columns::default();
    for (index, paragraph) in paragraphs.iter().enumerate() {
        let height = estimated_height(paragraph, column_width, line_height, &measure);
        if columns.left_height <= columns.right_height {
            columns.left.push(index);
            columns.left_height += height;
        } else {
            columns.right.push(index);
            columns.right_height += height;
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1 mm par caractère
    fn chars(s: &str) -> f32 {
        s.chars().count() as f32
    }

    #[test]
    fn test_estimated_height() {
        assert_eq!(estimated_height("abc", 10.0, 6.0, chars), 6.0);
        // 25 caractères sur 10 mm: 3 lignes
        assert_eq!(estimated_height(&"x".repeat(25), 10.0, 6.0, chars), 18.0);
        // Ligne exactement pleine: ⌊10/10⌋ + 1 = 2
        assert_eq!(estimated_height(&"x".repeat(10), 10.0, 6.0, chars), 12.0);
        assert_eq!(estimated_height("a\n\nb", 10.0, 6.0, chars), 18.0);
    }

    #[test]
    fn test_balance_ties_go_left() {
        let paragraphs: Vec<String> = vec!["a".into(), "b".into(), "c".into(), "d".into()];
        let columns = balance(&paragraphs, 10.0, 6.0, chars);
        assert_eq!(columns.left, vec![0, 2]);
        assert_eq!(columns.right, vec![1, 3]);
        assert_eq!(columns.left_height, columns.right_height);
    }

    #[test]
    fn test_balance_greedy() {
        let paragraphs: Vec<String> = vec!["x".repeat(45), "a".into(), "b".into(), "c".into()];
        let columns = balance(&paragraphs, 10.0, 6.0, chars);
        // 30 mm à gauche, puis les trois courts à droite
        assert_eq!(columns.left, vec![0]);
        assert_eq!(columns.right, vec![1, 2, 3]);
        assert_eq!(columns.left_height, 30.0);
        assert_eq!(columns.right_height, 18.0);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(balance(&[], 10.0, 6.0, chars), Columns::default());
    }
}
