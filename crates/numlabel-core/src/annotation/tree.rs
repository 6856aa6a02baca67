use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeParseError {
    #[error("Empty tree")]
    Empty,
    #[error("Unexpected end of input")]
    UnexpectedEnd,
    #[error("Unexpected token '{token}' at position {position}")]
    UnexpectedToken { token: String, position: usize },
    #[error("Trailing input after tree at position {0}")]
    TrailingInput(usize),
}

static TREE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(|\)|[^\s()]+").expect("valid tree token pattern"));

/// Constituency tree in Penn bracketed form, e.g. `(ROOT (S (NP (NNP Mary))))`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ParseTree {
    Leaf(String),
    Node {
        label: String,
        children: Vec<ParseTree>,
    },
}

impl ParseTree {
    pub fn parse(input: &str) -> Result<Self, TreeParseError> {
        let tokens: Vec<(usize, &str)> = TREE_TOKEN
            .find_iter(input)
            .map(|m| (m.start(), m.as_str()))
            .collect();

        if tokens.is_empty() {
            return Err(TreeParseError::Empty);
        }

        let mut cursor = 0;
        let tree = Self::parse_node(&tokens, &mut cursor)?;

        match tokens.get(cursor) {
            Some(&(position, _)) => Err(TreeParseError::TrailingInput(position)),
            None => Ok(tree),
        }
    }

    fn parse_node(tokens: &[(usize, &str)], cursor: &mut usize) -> Result<Self, TreeParseError> {
        let &(position, token) = tokens.get(*cursor).ok_or(TreeParseError::UnexpectedEnd)?;
        *cursor += 1;

        match token {
            "(" => {}
            ")" => {
                return Err(TreeParseError::UnexpectedToken {
                    token: token.to_string(),
                    position,
                })
            }
            word => return Ok(Self::Leaf(word.to_string())),
        }

        // "( (S ...))" has an empty root label.
        let label = match tokens.get(*cursor) {
            Some(&(_, "(" | ")")) => String::new(),
            Some(&(_, word)) => {
                *cursor += 1;
                word.to_string()
            }
            None => return Err(TreeParseError::UnexpectedEnd),
        };

        let mut children = Vec::new();
        loop {
            match tokens.get(*cursor) {
                Some(&(_, ")")) => {
                    *cursor += 1;
                    return Ok(Self::Node { label, children });
                }
                Some(_) => children.push(Self::parse_node(tokens, cursor)?),
                None => return Err(TreeParseError::UnexpectedEnd),
            }
        }
    }

    /// Node label, or the word itself for a leaf.
    pub fn label(&self) -> &str {
        match self {
            Self::Leaf(word) => word,
            Self::Node { label, .. } => label,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    pub fn children(&self) -> &[ParseTree] {
        match self {
            Self::Leaf(_) => &[],
            Self::Node { children, .. } => children,
        }
    }

    pub fn leaves(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Leaf(word) => out.push(word),
            Self::Node { children, .. } => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }

    /// Leaf words joined by single spaces.
    pub fn flatten(&self) -> String {
        self.leaves().join(" ")
    }

    /// Innermost `NP` subtrees below this node, flattened to text.
    ///
    /// An `NP` that contains another `NP` is replaced by its nested ones, so
    /// `(NP (NP the fund) (PP of (NP the prize)))` yields `the fund` and
    /// `the prize`.
    pub fn noun_phrases(&self) -> Vec<String> {
        let mut found = Vec::new();
        self.collect_noun_phrases(&mut found);
        found.into_iter().map(Self::flatten).collect()
    }

    fn collect_noun_phrases<'a>(&'a self, out: &mut Vec<&'a ParseTree>) {
        for child in self.children() {
            if child.is_leaf() {
                continue;
            }
            let before = out.len();
            child.collect_noun_phrases(out);
            if child.label() == "NP" && out.len() == before {
                out.push(child);
            }
        }
    }
}

impl std::fmt::Display for ParseTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Leaf(word) => f.write_str(word),
            Self::Node { label, children } => {
                write!(f, "({label}")?;
                for child in children {
                    write!(f, " {child}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl std::str::FromStr for ParseTree {
    type Err = TreeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ParseTree {
    type Error = TreeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ParseTree> for String {
    fn from(tree: ParseTree) -> Self {
        tree.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAN_DIEGO: &str = "(ROOT (S (NP (NNP San) (NNP Diego)) (VP (VBZ is) \
        (NP (NP (DT a) (NN place)) (PP (IN in) (NP (DT the) (NNP United) (NNPS States))))) (. .)))";

    #[test]
    fn test_parse_and_display() {
        let tree = ParseTree::parse("(ROOT (NP (NNP Mary)))").unwrap();
        assert_eq!(tree.label(), "ROOT");
        assert_eq!(tree.to_string(), "(ROOT (NP (NNP Mary)))");
        assert_eq!(tree.leaves(), vec!["Mary"]);
    }

    #[test]
    fn test_noun_phrases_are_innermost() {
        let tree = ParseTree::parse(SAN_DIEGO).unwrap();
        assert_eq!(
            tree.noun_phrases(),
            vec!["San Diego", "a place", "the United States"]
        );
    }

    #[test]
    fn test_empty_root_label() {
        let tree = ParseTree::parse("( (S (NP (PRP It))))").unwrap();
        assert_eq!(tree.label(), "");
        assert_eq!(tree.noun_phrases(), vec!["It"]);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(ParseTree::parse("   "), Err(TreeParseError::Empty));
        assert_eq!(ParseTree::parse("(S (NP x)"), Err(TreeParseError::UnexpectedEnd));
        assert!(matches!(
            ParseTree::parse(")"),
            Err(TreeParseError::UnexpectedToken { position: 0, .. })
        ));
        assert!(matches!(
            ParseTree::parse("(S x) y"),
            Err(TreeParseError::TrailingInput(6))
        ));
    }

    #[test]
    fn test_serde_as_bracketed_string() {
        let tree: ParseTree = serde_json::from_str("\"(NP (NNP San) (NNP Diego))\"").unwrap();
        assert_eq!(tree.flatten(), "San Diego");
        assert_eq!(
            serde_json::to_string(&tree).unwrap(),
            "\"(NP (NNP San) (NNP Diego))\""
        );
    }
}
