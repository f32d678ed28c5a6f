use std::fmt;

use serde::{Deserialize, Serialize};

use super::ModelData;

/// Left or right hand side of a condition, assignment or calculation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Operand {
    Number(i64),
    /// `vars['name']`
    Variable(String),
    /// Any other bare word, e.g. `PATH_RANDOMSHORT`.
    Constant(String),
}

impl Operand {
    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable(name.into())
    }

    /// Classifies operand text. The result renders back to exactly `text`;
    /// numbers are only recognised in their canonical spelling.
    pub fn parse(text: &str) -> Self {
        if let Some(name) = text
            .strip_prefix("vars['")
            .and_then(|rest| rest.strip_suffix("']"))
        {
            if !name.contains('\'') {
                return Self::Variable(name.to_string());
            }
        }
        match text.parse::<i64>() {
            Ok(value) if value.to_string() == text => Self::Number(value),
            _ => Self::Constant(text.to_string()),
        }
    }

    pub fn variable_name(&self) -> Option<&str> {
        match self {
            Self::Variable(name) => Some(name),
            _ => None,
        }
    }

    pub fn constant_name(&self) -> Option<&str> {
        match self {
            Self::Constant(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Variable(name) => write!(f, "vars['{name}']"),
            Self::Constant(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
}

impl Comparison {
    /// Two character operators come first so `>=` wins over `>`.
    pub const ALL: [Comparison; 6] = [
        Self::Ge,
        Self::Le,
        Self::Eq,
        Self::Ne,
        Self::Gt,
        Self::Lt,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Lt => "<",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Compound assignment operator of a `Calculate` action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithmeticOp {
    #[serde(rename = "+=")]
    Add,
    #[serde(rename = "-=")]
    Sub,
    #[serde(rename = "*=")]
    Mul,
    #[serde(rename = "/=")]
    Div,
    #[serde(rename = "%=")]
    Rem,
}

impl ArithmeticOp {
    pub const ALL: [ArithmeticOp; 5] = [Self::Add, Self::Sub, Self::Mul, Self::Div, Self::Rem];

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+=",
            Self::Sub => "-=",
            Self::Mul => "*=",
            Self::Div => "/=",
            Self::Rem => "%=",
        }
    }
}

impl fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub left: Operand,
    pub comparison: Comparison,
    pub right: Operand,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.left, self.comparison, self.right)
    }
}

/// Body of an `if` or `else if`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conditional {
    pub condition: Condition,
    pub actions: Vec<Action>,
    pub track: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElseBlock {
    pub actions: Vec<Action>,
    pub track: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchTo {
    /// Target node; may be `-1`, the sentinel, or otherwise dangling.
    pub node: i64,
    pub of_section: i64,
    pub immediate: bool,
    pub track: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WaitDuration {
    Millis(i64),
    /// Engine constant such as `PATH_TIMETONEXTNODE`.
    Symbol(String),
}

impl fmt::Display for WaitDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Millis(value) => write!(f, "{value}"),
            Self::Symbol(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitTime {
    pub lowest: i64,
    pub duration: WaitDuration,
    pub track: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fade {
    pub to_volume: i64,
    /// Fade curve constant, e.g. `PATH_FADE_LINEAR`.
    pub curve: String,
    pub flip: i64,
    pub duration_ms: i64,
    pub track: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetValue {
    pub left: Operand,
    pub right: Operand,
    pub track: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calculate {
    pub left: Operand,
    pub operator: ArithmeticOp,
    pub right: Operand,
    pub track: usize,
}

/// One entry of an event script. Conditionals own their nested action list;
/// an `if` followed by sibling `else if`/`else` entries forms one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    If(Conditional),
    ElseIf(Conditional),
    Else(ElseBlock),
    BranchTo(BranchTo),
    WaitTime(WaitTime),
    Fade(Fade),
    SetValue(SetValue),
    Calculate(Calculate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    If,
    ElseIf,
    Else,
    BranchTo,
    WaitTime,
    Fade,
    SetValue,
    Calculate,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::If(_) => ActionKind::If,
            Self::ElseIf(_) => ActionKind::ElseIf,
            Self::Else(_) => ActionKind::Else,
            Self::BranchTo(_) => ActionKind::BranchTo,
            Self::WaitTime(_) => ActionKind::WaitTime,
            Self::Fade(_) => ActionKind::Fade,
            Self::SetValue(_) => ActionKind::SetValue,
            Self::Calculate(_) => ActionKind::Calculate,
        }
    }

    /// Index of the track stream the action executes on.
    pub fn track(&self) -> usize {
        match self {
            Self::If(c) | Self::ElseIf(c) => c.track,
            Self::Else(e) => e.track,
            Self::BranchTo(b) => b.track,
            Self::WaitTime(w) => w.track,
            Self::Fade(f) => f.track,
            Self::SetValue(s) => s.track,
            Self::Calculate(c) => c.track,
        }
    }

    pub fn children(&self) -> Option<&[Action]> {
        match self {
            Self::If(c) | Self::ElseIf(c) => Some(&c.actions),
            Self::Else(e) => Some(&e.actions),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Action>> {
        match self {
            Self::If(c) | Self::ElseIf(c) => Some(&mut c.actions),
            Self::Else(e) => Some(&mut e.actions),
            _ => None,
        }
    }

    pub fn is_conditional(&self) -> bool {
        self.children().is_some()
    }

    /// `else if` and `else` extend the chain of the preceding sibling.
    pub fn continues_chain(&self) -> bool {
        matches!(self, Self::ElseIf(_) | Self::Else(_))
    }

    /// Operands read or written by the action. Only conditions, assignments
    /// and calculations take part in variable lookups.
    pub fn operands(&self) -> Vec<&Operand> {
        match self {
            Self::If(c) | Self::ElseIf(c) => vec![&c.condition.left, &c.condition.right],
            Self::SetValue(s) => vec![&s.left, &s.right],
            Self::Calculate(c) => vec![&c.left, &c.right],
            _ => Vec::new(),
        }
    }

    /// Default action of `kind` as inserted by the editor, bound to the first
    /// declared variable where an operand is needed.
    pub fn template(kind: ActionKind, data: &ModelData) -> Self {
        let operand = data
            .variables
            .first()
            .map(|var| Operand::variable(var.name.as_str()))
            .unwrap_or(Operand::Number(0));
        let condition = || Condition {
            left: operand.clone(),
            comparison: Comparison::Eq,
            right: Operand::Number(0),
        };
        match kind {
            ActionKind::If => Self::If(Conditional {
                condition: condition(),
                actions: Vec::new(),
                track: 0,
            }),
            ActionKind::ElseIf => Self::ElseIf(Conditional {
                condition: condition(),
                actions: Vec::new(),
                track: 0,
            }),
            ActionKind::Else => Self::Else(ElseBlock {
                actions: Vec::new(),
                track: 0,
            }),
            ActionKind::BranchTo => Self::BranchTo(BranchTo {
                node: -1,
                of_section: -1,
                immediate: false,
                track: 0,
            }),
            ActionKind::WaitTime => Self::WaitTime(WaitTime {
                lowest: 0,
                duration: WaitDuration::Millis(0),
                track: 0,
            }),
            ActionKind::Fade => Self::Fade(Fade {
                to_volume: 0,
                curve: "PATH_FADE_LINEAR".to_string(),
                flip: 0,
                duration_ms: 0,
                track: 0,
            }),
            ActionKind::SetValue => Self::SetValue(SetValue {
                left: operand,
                right: Operand::Number(0),
                track: 0,
            }),
            ActionKind::Calculate => Self::Calculate(Calculate {
                left: operand,
                operator: ArithmeticOp::Add,
                right: Operand::Number(0),
                track: 0,
            }),
        }
    }
}
