//! Utilities.
use anyhow::{anyhow, Result};
use candle_core::{backprop::GradStore, Tensor, Var};
use candle_nn::VarMap;
use log::trace;

/// Copies every variable of `src` into the variable of `dest` with the same name.
///
/// The copy is independent: later updates of `src` are not visible through `dest`.
pub fn hard_update(dest: &VarMap, src: &VarMap) -> Result<()> {
    let dest = dest
        .data()
        .lock()
        .map_err(|_| anyhow!("lock of the destination VarMap is poisoned"))?;
    let src = src
        .data()
        .lock()
        .map_err(|_| anyhow!("lock of the source VarMap is poisoned"))?;

    for (k, v_dest) in dest.iter() {
        let v_src = src
            .get(k)
            .ok_or_else(|| anyhow!("variable {} is missing in the source VarMap", k))?;
        trace!("copy {}", k);
        v_dest.set(&v_src.as_tensor().copy()?)?;
    }

    Ok(())
}

/// Elementwise Huber loss with threshold one.
///
/// Quadratic `0.5 x^2` for `|x| <= 1` and linear `|x| - 0.5` beyond.
pub fn huber(x: &Tensor) -> Result<Tensor> {
    let a = x.abs()?;
    let quad = a.minimum(1.0)?;
    let lin = (&a - &quad)?;
    Ok((quad.sqr()?.affine(0.5, 0.0)? + lin)?)
}

/// Global L2 norm of the gradients of `vars`.
pub fn grad_norm(grads: &GradStore, vars: &[Var]) -> Result<f32> {
    let mut sum = 0f32;
    for var in vars.iter() {
        if let Some(g) = grads.get(var.as_tensor()) {
            sum += g.sqr()?.sum_all()?.to_scalar::<f32>()?;
        }
    }
    Ok(sum.sqrt())
}

/// Scales the gradients of `vars` so that their global norm is at most `max_norm`.
///
/// Returns the norm before clipping.
pub fn clip_grad_norm(grads: &mut GradStore, vars: &[Var], max_norm: f64) -> Result<f32> {
    let norm = grad_norm(grads, vars)?;
    if (norm as f64) > max_norm {
        let scale = max_norm / (norm as f64 + 1e-6);
        for var in vars.iter() {
            if let Some(g) = grads.remove(var.as_tensor()) {
                grads.insert(var.as_tensor(), g.affine(scale, 0.0)?);
            }
        }
    }
    Ok(norm)
}

/// Returns the values of the variable `name` in `varmap`.
pub fn var_values(varmap: &VarMap, name: &str) -> Result<Vec<f32>> {
    let data = varmap
        .data()
        .lock()
        .map_err(|_| anyhow!("lock of the VarMap is poisoned"))?;
    let var = data
        .get(name)
        .ok_or_else(|| anyhow!("variable {} is not found", name))?;
    Ok(var.as_tensor().flatten_all()?.to_vec1::<f32>()?)
}

/// Overwrites the variable `name` in `varmap`.
pub fn set_var(varmap: &VarMap, name: &str, value: &Tensor) -> Result<()> {
    let data = varmap
        .data()
        .lock()
        .map_err(|_| anyhow!("lock of the VarMap is poisoned"))?;
    let var = data
        .get(name)
        .ok_or_else(|| anyhow!("variable {} is not found", name))?;
    var.set(value)?;
    Ok(())
}
