//! Right-hand side and sparse Jacobian assembly.

use nn_symbolic::NuclideRhs;

use super::line;
use crate::context::EmitContext;
use crate::error::EmitResult;

const YDOT: &str = "ydot_nuc";

pub(crate) fn ydot(ctx: &EmitContext<'_>, n: usize, out: &mut String) -> EmitResult<()> {
    let system = ctx.symbolic()?;
    let printer = ctx.printer();
    let ind = ctx.indent(n);
    let pair_ind = ctx.indent(2 * n);

    for (nuc, rhs) in ctx.graph().nuclides().iter().zip(&system.rhs) {
        let c = nuc.cindex();
        let pairs = match rhs {
            NuclideRhs::Pairs(pairs) if !pairs.is_empty() => pairs,
            _ => {
                line(out, &ind, format_args!("{YDOT}({c}) = 0.0;\n"));
                continue;
            }
        };

        line(out, &ind, format_args!("{YDOT}({c}) ="));
        for (j, pair) in pairs.iter().enumerate() {
            let sides: Vec<String> = pair
                .forward
                .iter()
                .chain(&pair.reverse)
                .map(|e| printer.expr(e))
                .collect();
            out.push_str(&pair_ind);
            if sides.len() == 2 {
                out.push_str(&format!("({} + {})", sides[0], sides[1]));
            } else {
                out.push_str(&sides.concat());
            }
            if j + 1 == pairs.len() {
                out.push_str(";\n\n");
            } else {
                out.push_str(" +\n");
            }
        }
    }
    Ok(())
}

/// Only cells with a structurally present derivative are written.
pub(crate) fn jacnuc(ctx: &EmitContext<'_>, n: usize, out: &mut String) -> EmitResult<()> {
    let system = ctx.symbolic()?;
    let printer = ctx.printer();
    let ind = ctx.indent(n);
    let nuclides = ctx.graph().nuclides();

    for (row, col, cell) in system.jacobian.live_cells() {
        line(out, &ind, format_args!("scratch = {};", printer.expr(&cell.expr)));
        line(
            out,
            &ind,
            format_args!(
                "jac.set({}, {}, scratch);\n",
                nuclides[row].cindex(),
                nuclides[col].cindex()
            ),
        );
    }
    Ok(())
}
