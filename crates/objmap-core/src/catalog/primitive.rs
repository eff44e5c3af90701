#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Primitive {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F32,
    F64,
}

#[derive(Debug, Copy, Clone)]
enum Numeric {
    Int { signed: bool, bits: u32, pointer: bool },
    Float { bits: u32 },
}

impl Primitive {
    pub const ALL: [Primitive; 16] = [
        Primitive::Bool,
        Primitive::Char,
        Primitive::I8,
        Primitive::I16,
        Primitive::I32,
        Primitive::I64,
        Primitive::I128,
        Primitive::Isize,
        Primitive::U8,
        Primitive::U16,
        Primitive::U32,
        Primitive::U64,
        Primitive::U128,
        Primitive::Usize,
        Primitive::F32,
        Primitive::F64,
    ];

    pub fn name(self) -> &'static str {
        use Primitive::*;

        match self {
            Bool => "bool",
            Char => "char",
            I8 => "i8",
            I16 => "i16",
            I32 => "i32",
            I64 => "i64",
            I128 => "i128",
            Isize => "isize",
            U8 => "u8",
            U16 => "u16",
            U32 => "u32",
            U64 => "u64",
            U128 => "u128",
            Usize => "usize",
            F32 => "f32",
            F64 => "f64",
        }
    }

    pub fn from_name(name: &str) -> Option<Primitive> {
        Primitive::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn is_numeric(self) -> bool {
        self.numeric().is_some()
    }

    fn numeric(self) -> Option<Numeric> {
        use Primitive::*;

        let int = |signed, bits| Numeric::Int {
            signed,
            bits,
            pointer: false,
        };

        Some(match self {
            I8 => int(true, 8),
            I16 => int(true, 16),
            I32 => int(true, 32),
            I64 => int(true, 64),
            I128 => int(true, 128),
            U8 => int(false, 8),
            U16 => int(false, 16),
            U32 => int(false, 32),
            U64 => int(false, 64),
            U128 => int(false, 128),
            Isize => Numeric::Int {
                signed: true,
                bits: 64,
                pointer: true,
            },
            Usize => Numeric::Int {
                signed: false,
                bits: 64,
                pointer: true,
            },
            F32 => Numeric::Float { bits: 32 },
            F64 => Numeric::Float { bits: 64 },
            Bool | Char => return None,
        })
    }

    /// Lossless conversions the host performs without an explicit cast.
    pub fn widens_to(self, to: Primitive) -> bool {
        use Primitive::*;

        if self == to {
            return true;
        }

        match (self, to) {
            (Bool, _) => matches!(
                to,
                I8 | I16 | I32 | I64 | I128 | Isize | U8 | U16 | U32 | U64 | U128 | Usize
            ),
            (Char, _) => matches!(to, U32 | U64 | U128),
            (U8, Char) => true,
            (_, Bool | Char) => false,
            _ => match (self.numeric(), to.numeric()) {
                (
                    Some(Numeric::Int {
                        signed: from_signed,
                        bits: from_bits,
                        pointer: from_pointer,
                    }),
                    Some(Numeric::Int {
                        signed: to_signed,
                        bits: to_bits,
                        pointer: to_pointer,
                    }),
                ) => {
                    if from_pointer {
                        false
                    } else if to_pointer {
                        match (from_signed, to_signed) {
                            (false, false) => from_bits <= 16,
                            (true, true) => from_bits <= 16,
                            (false, true) => from_bits <= 8,
                            (true, false) => false,
                        }
                    } else {
                        match (from_signed, to_signed) {
                            (true, false) => false,
                            _ => from_bits < to_bits,
                        }
                    }
                }
                (Some(Numeric::Int { bits, pointer, .. }), Some(Numeric::Float { bits: fb })) => {
                    !pointer && if fb == 32 { bits <= 16 } else { bits <= 32 }
                }
                (Some(Numeric::Float { bits: a }), Some(Numeric::Float { bits: b })) => a < b,
                _ => false,
            },
        }
    }

    /// Conversions the host allows only with an explicit cast.
    pub fn casts_to(self, to: Primitive) -> bool {
        use Primitive::*;

        match (self, to) {
            (Char, _) => to.numeric().is_some_and(|n| matches!(n, Numeric::Int { .. })),
            (_, Char) => self == U8,
            (Bool, _) => to.numeric().is_some_and(|n| matches!(n, Numeric::Int { .. })),
            (_, Bool) => false,
            _ => self.is_numeric() && to.is_numeric(),
        }
    }
}

impl core::fmt::Display for Primitive {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
