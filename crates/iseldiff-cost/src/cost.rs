//! Static per-instruction cost table.
//!
//! Costs are coarse latency classes, not cycle counts: the point is to rank
//! two instruction selections for the same program, so only relative weight
//! matters. Vocabulary covers the RV64 base + pseudo-instructions the code
//! printer emits.

/// One ALU or FPU operation.
pub const COST_ALU: u32 = 1;
/// Memory access (integer or FP).
pub const COST_LOAD_STORE: u32 = 2;
/// Taken-or-not branch, including unconditional jumps.
pub const COST_BRANCH: u32 = 3;
/// Multiply.
pub const COST_MUL: u32 = COST_BRANCH;
/// Divide / remainder.
pub const COST_DIV: u32 = 8;
/// Call into a builtin or another code object.
pub const COST_CALL: u32 = 20;
/// Return.
pub const COST_RET: u32 = 2;

const COST_FPU: u32 = COST_ALU;
const COST_FPU_LOAD_STORE: u32 = COST_LOAD_STORE;

/// Cost of one instruction, or `None` for an unknown mnemonic.
///
/// `li` is data-dependent: an immediate that fits 12 signed bits (one
/// `addi`) or has its low 12 bits clear (one `lui`) is a single ALU op;
/// anything else expands to a `lui` + `addi` pair and costs double.
#[must_use]
pub fn instruction_cost(mnemonic: &str, operands: &str) -> Option<u32> {
    if mnemonic == "li" {
        return Some(li_cost(operands));
    }

    let cost = match mnemonic {
        // Arithmetic / logic
        "add" | "addi" | "addiw" | "addw" | "and" | "andi" | "lui" | "mv" | "neg" | "negw"
        | "nop" | "not" | "or" | "ori" | "seqz" | "sext" | "sext.w" | "sgt" | "sgtu" | "sgtz"
        | "sll" | "slli" | "slliw" | "sllw" | "slt" | "slti" | "sltiu" | "sltu" | "snez"
        | "sra" | "srai" | "sraiw" | "sraw" | "srl" | "srli" | "srliw" | "srlw" | "sub"
        | "subw" | "xor" | "xori" => COST_ALU,
        // Loads / stores
        "lb" | "lbu" | "ld" | "lh" | "lhu" | "lw" | "lwu" | "sb" | "sd" | "sh" | "sw" => {
            COST_LOAD_STORE
        }
        // Branches and jumps
        "beq" | "beqz" | "bge" | "bgeu" | "bgez" | "bgt" | "bgtu" | "bgtz" | "ble" | "bleu"
        | "blez" | "blt" | "bltu" | "bltz" | "bne" | "bnez" | "j" | "jr" => COST_BRANCH,
        // Multiply / divide
        "mul" | "mulh" | "mulhu" | "mulw" => COST_MUL,
        "div" | "divu" | "divuw" | "divw" | "rem" | "remu" | "remuw" | "remw" => COST_DIV,
        // Calls and returns
        "call" => COST_CALL,
        "ret" => COST_RET,
        // Benign placeholder; unreachable unless undefined behavior slipped
        // into the generated program.
        "ebreak" => 0,
        // Floating point
        "fadd.d" | "fadd.s" | "fcvt.d.l" | "fcvt.d.lu" | "fcvt.d.s" | "fcvt.d.w"
        | "fcvt.d.wu" | "fcvt.l.d" | "fcvt.l.s" | "fcvt.lu.d" | "fcvt.lu.s" | "fcvt.s.d"
        | "fcvt.s.l" | "fcvt.s.lu" | "fcvt.s.w" | "fcvt.s.wu" | "fcvt.w.d" | "fcvt.w.s"
        | "fcvt.wu.d" | "fcvt.wu.s" | "fdiv.d" | "fdiv.s" | "feq.d" | "feq.s" | "fge.d"
        | "fge.s" | "fgt.d" | "fgt.s" | "fle.d" | "fle.s" | "flt.d" | "flt.s" | "fmadd.d"
        | "fmadd.s" | "fmul.d" | "fmul.s" | "fmv.d" | "fmv.d.x" | "fmv.s" | "fmv.s.x"
        | "fmv.w.x" | "fmv.x.s" | "fneg.d" | "fneg.s" | "fnmsub.d" | "fsub.d" | "fsub.s" => {
            COST_FPU
        }
        "fld" | "flw" | "fsd" | "fsw" => COST_FPU_LOAD_STORE,
        _ => return None,
    };
    Some(cost)
}

/// Immediate materialization cost for `li`.
///
/// An unparseable immediate is costed at the two-instruction worst case.
fn li_cost(operands: &str) -> u32 {
    let Some(imm) = operands
        .rsplit([' ', '\t', ','])
        .find(|tok| !tok.is_empty())
        .and_then(|tok| tok.parse::<i64>().ok())
    else {
        return COST_ALU * 2;
    };

    if (-2048..2048).contains(&imm) {
        COST_ALU // addi
    } else if imm & 0xFFF == 0 {
        COST_ALU // lui
    } else {
        COST_ALU * 2 // lui + addi
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_classes() {
        assert_eq!(instruction_cost("add", "a0, a1, a2"), Some(COST_ALU));
        assert_eq!(instruction_cost("sw", "a0, 0(sp)"), Some(COST_LOAD_STORE));
        assert_eq!(instruction_cost("beq", "a0, a1, 8"), Some(COST_BRANCH));
        assert_eq!(instruction_cost("mul", "a0, a1, a2"), Some(COST_MUL));
        assert_eq!(instruction_cost("divw", "a0, a1, a2"), Some(COST_DIV));
        assert_eq!(instruction_cost("call", "0x1234"), Some(COST_CALL));
        assert_eq!(instruction_cost("ret", ""), Some(COST_RET));
        assert_eq!(instruction_cost("ebreak", ""), Some(0));
        assert_eq!(instruction_cost("fadd.d", "fa0, fa1, fa2"), Some(COST_ALU));
        assert_eq!(instruction_cost("fld", "fa0, 0(sp)"), Some(COST_LOAD_STORE));
    }

    #[test]
    fn test_unknown_mnemonic() {
        assert_eq!(instruction_cost("vadd.vv", "v0, v1, v2"), None);
    }

    #[test]
    fn test_li_small_immediate() {
        assert_eq!(instruction_cost("li", "a0, 100"), Some(1));
        assert_eq!(instruction_cost("li", "a0, -2048"), Some(1));
        assert_eq!(instruction_cost("li", "a0, 2047"), Some(1));
    }

    #[test]
    fn test_li_lui_shaped_immediate() {
        // Low 12 bits clear: single lui.
        assert_eq!(instruction_cost("li", "a0, 4096"), Some(1));
        assert_eq!(instruction_cost("li", "a0, 8192"), Some(1));
    }

    #[test]
    fn test_li_wide_immediate() {
        assert_eq!(instruction_cost("li", "a0, 4097"), Some(2));
        assert_eq!(instruction_cost("li", "a0, 123456789"), Some(2));
    }

    #[test]
    fn test_li_unparseable_is_worst_case() {
        assert_eq!(instruction_cost("li", "a0, sym+4"), Some(2));
    }
}
