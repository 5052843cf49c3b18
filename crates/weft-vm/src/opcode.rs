use weft_core::StackEffect;

/// Kind of parameter an operation expects in the cell after its opcode.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ParamKind {
    /// Self-contained; no parameter cell.
    None,
    /// A boxed value (LITERAL).
    Literal,
    /// A signed branch offset (BRANCH, 0BRANCH).
    Offset,
    /// The entry of another compiled definition (CALL).
    Callee,
}

/// The primitive instruction set.
///
/// Each opcode carries a declared stack effect and parameter kind; the
/// compiler and verifier consume those declarations, the machine implements
/// the behavior.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Opcode {
    Call,
    Return,
    Literal,
    Branch,
    ZBranch,
    Drop,
    Dup,
    Over,
    Rot,
    Swap,
    Plus,
    Minus,
    Mult,
    Div,
    Mod,
    Abs,
    Min,
    Max,
    Square,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    EqZero,
    NeZero,
    GtZero,
    LtZero,
    One,
    Zero,
}

impl Opcode {
    /// Every opcode, in declaration order.
    pub const ALL: [Opcode; 31] = [
        Opcode::Call,
        Opcode::Return,
        Opcode::Literal,
        Opcode::Branch,
        Opcode::ZBranch,
        Opcode::Drop,
        Opcode::Dup,
        Opcode::Over,
        Opcode::Rot,
        Opcode::Swap,
        Opcode::Plus,
        Opcode::Minus,
        Opcode::Mult,
        Opcode::Div,
        Opcode::Mod,
        Opcode::Abs,
        Opcode::Min,
        Opcode::Max,
        Opcode::Square,
        Opcode::Eq,
        Opcode::Ne,
        Opcode::Gt,
        Opcode::Ge,
        Opcode::Lt,
        Opcode::Le,
        Opcode::EqZero,
        Opcode::NeZero,
        Opcode::GtZero,
        Opcode::LtZero,
        Opcode::One,
        Opcode::Zero,
    ];

    /// The Forth-style name this opcode answers to in source text.
    pub fn forth_name(self) -> &'static str {
        match self {
            Opcode::Call => "CALL",
            Opcode::Return => "RETURN",
            Opcode::Literal => "LITERAL",
            Opcode::Branch => "BRANCH",
            Opcode::ZBranch => "0BRANCH",
            Opcode::Drop => "DROP",
            Opcode::Dup => "DUP",
            Opcode::Over => "OVER",
            Opcode::Rot => "ROT",
            Opcode::Swap => "SWAP",
            Opcode::Plus => "+",
            Opcode::Minus => "-",
            Opcode::Mult => "*",
            Opcode::Div => "/",
            Opcode::Mod => "MOD",
            Opcode::Abs => "ABS",
            Opcode::Min => "MIN",
            Opcode::Max => "MAX",
            Opcode::Square => "SQUARE",
            Opcode::Eq => "=",
            Opcode::Ne => "<>",
            Opcode::Gt => ">",
            Opcode::Ge => ">=",
            Opcode::Lt => "<",
            Opcode::Le => "<=",
            Opcode::EqZero => "0=",
            Opcode::NeZero => "0<>",
            Opcode::GtZero => "0>",
            Opcode::LtZero => "0<",
            Opcode::One => "ONE",
            Opcode::Zero => "ZERO",
        }
    }

    /// Declared stack effect. CALL's entry is a placeholder; a call site's
    /// real effect is its callee's.
    pub fn effect(self) -> StackEffect {
        match self {
            Opcode::Call | Opcode::Return | Opcode::Branch => StackEffect::new(0, 0),
            Opcode::Literal | Opcode::One | Opcode::Zero => StackEffect::new(0, 1),
            Opcode::ZBranch | Opcode::Drop => StackEffect::new(1, 0),
            Opcode::Dup => StackEffect::new(1, 2),
            Opcode::Over => StackEffect::new(2, 3),
            Opcode::Rot => StackEffect::new(3, 3),
            Opcode::Swap => StackEffect::new(2, 2),
            Opcode::Plus
            | Opcode::Minus
            | Opcode::Mult
            | Opcode::Div
            | Opcode::Mod
            | Opcode::Min
            | Opcode::Max
            | Opcode::Eq
            | Opcode::Ne
            | Opcode::Gt
            | Opcode::Ge
            | Opcode::Lt
            | Opcode::Le => StackEffect::new(2, 1),
            Opcode::Abs
            | Opcode::Square
            | Opcode::EqZero
            | Opcode::NeZero
            | Opcode::GtZero
            | Opcode::LtZero => StackEffect::new(1, 1),
        }
    }

    /// What the cell after this opcode holds.
    pub fn param_kind(self) -> ParamKind {
        match self {
            Opcode::Call => ParamKind::Callee,
            Opcode::Literal => ParamKind::Literal,
            Opcode::Branch | Opcode::ZBranch => ParamKind::Offset,
            _ => ParamKind::None,
        }
    }
}
