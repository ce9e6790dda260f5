#[cfg(test)]
mod tests {
    use crate::virtual_machine::isa::{Instruction, Reg};
    use crate::virtual_machine::operand::{Operand, Target};

    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;
    const EXPECTED_ISA_HASH: u64 = 1576989946260136656;

    fn fnv1a64(mut h: u64, bytes: &[u8]) -> u64 {
        for b in bytes {
            h ^= *b as u64;
            h = h.wrapping_mul(FNV_PRIME);
        }
        h
    }

    macro_rules! hash_conditions {
        (
            $( $(#[$doc:meta])* $name:ident = $method:ident, $mnemonic:literal => [ $( $flag:ident )|+ ] ),* $(,)?
        ) => {{
            let mut h = FNV_OFFSET;
            $(
                h = fnv1a64(h, stringify!($name).as_bytes());
                h = fnv1a64(h, stringify!($method).as_bytes());
                h = fnv1a64(h, $mnemonic.as_bytes());
                $( h = fnv1a64(h, stringify!($flag).as_bytes()); )+
            )*
            h
        }};
    }

    fn current_isa_hash() -> u64 {
        let mut h = crate::for_each_condition!(hash_conditions);
        let base = [
            Instruction::Mov {
                dst: Reg(0),
                src: Operand::Imm(0),
            },
            Instruction::Inc {
                dst: Reg(0),
                step: None,
            },
            Instruction::Dec {
                dst: Reg(0),
                step: None,
            },
            Instruction::Cmp {
                reg: Reg(0),
                rhs: Operand::Imm(0),
            },
            Instruction::Jmp {
                target: Target::Position(0),
            },
        ];
        for instr in &base {
            h = fnv1a64(h, instr.mnemonic().as_bytes());
        }
        h
    }

    #[test]
    #[ignore]
    fn print_isa_hash() {
        println!("ISA_HASH={}", current_isa_hash());
    }

    #[test]
    fn isa_hash_unchanged() {
        assert_eq!(current_isa_hash(), EXPECTED_ISA_HASH);
    }
}
