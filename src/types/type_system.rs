//! Type System for Pascal8
//!
//! Two fixed-width integer kinds plus the attribute records every pass
//! attaches to a name.

/// Value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymType {
    /// One storage unit
    Integer,
    /// Two storage units, little-endian
    Long,
}

impl SymType {
    /// Resolve a type keyword
    pub fn from_keyword(name: &str) -> Option<Self> {
        match name {
            "integer" => Some(Self::Integer),
            "long" => Some(Self::Long),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Long => "long",
        }
    }

    /// Size in storage units (bytes)
    pub fn size_of(&self) -> u8 {
        match self {
            Self::Integer => 1,
            Self::Long => 2,
        }
    }

    pub fn is_wide(&self) -> bool {
        matches!(self, Self::Long)
    }
}

/// Where a variable lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    /// Pinned to a general register; nothing allocates these yet
    #[allow(dead_code)]
    Register(u8),
    /// Frame-base relative slot in the stack region
    Stack,
    /// Named fixed memory location
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarAttrs {
    pub ty: SymType,
    pub storage: Storage,
    pub is_global: bool,
    pub is_const: bool,
}

impl VarAttrs {
    /// Attributes of a declared variable; globals get fixed storage,
    /// everything else lives in the frame
    pub fn declared(ty: SymType, is_global: bool, is_const: bool) -> Self {
        Self {
            ty,
            storage: if is_global { Storage::Fixed } else { Storage::Stack },
            is_global,
            is_const,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcAttrs {
    pub params: Vec<SymType>,
}

impl ProcAttrs {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Symbol attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolAttrs {
    Variable(VarAttrs),
    Procedure(ProcAttrs),
    /// Builtin type keyword
    Type(SymType),
}

impl SymbolAttrs {
    pub fn as_var(&self) -> Option<&VarAttrs> {
        match self {
            Self::Variable(var) => Some(var),
            _ => None,
        }
    }

    pub fn as_proc(&self) -> Option<&ProcAttrs> {
        match self {
            Self::Procedure(proc) => Some(proc),
            _ => None,
        }
    }

    /// Attributes seeded for a builtin name
    pub fn builtin(builtin: Builtin) -> Self {
        match builtin {
            Builtin::Type(ty) => Self::Type(ty),
            Builtin::Intrinsic(intrinsic) => Self::Procedure(ProcAttrs {
                params: intrinsic.params().to_vec(),
            }),
        }
    }
}

/// Procedures lowered to fixed instruction sequences instead of a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intrinsic {
    Cls,
    Break,
    MakeBcd,
    DebugPrintBcd,
    DebugPrintBcdHigh,
}

impl Intrinsic {
    pub const ALL: [Intrinsic; 5] = [
        Intrinsic::Cls,
        Intrinsic::Break,
        Intrinsic::MakeBcd,
        Intrinsic::DebugPrintBcd,
        Intrinsic::DebugPrintBcdHigh,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Cls => "cls",
            Self::Break => "break",
            Self::MakeBcd => "make_bcd",
            Self::DebugPrintBcd => "debug_print_bcd",
            Self::DebugPrintBcdHigh => "debug_print_bcd_high",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.name() == name)
    }

    pub fn params(&self) -> &'static [SymType] {
        match self {
            Self::MakeBcd => &[SymType::Long],
            _ => &[],
        }
    }
}

/// Names every scope chain resolves without a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Type(SymType),
    Intrinsic(Intrinsic),
}

impl Builtin {
    pub fn all() -> impl Iterator<Item = Builtin> {
        [SymType::Integer, SymType::Long]
            .into_iter()
            .map(Builtin::Type)
            .chain(Intrinsic::ALL.into_iter().map(Builtin::Intrinsic))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Type(ty) => ty.keyword(),
            Self::Intrinsic(intrinsic) => intrinsic.name(),
        }
    }
}
