//! Adadelta parameter updates
//!
//! Keeps two mirror-shaped accumulators per parameter tensor: the decayed
//! mean of squared gradients and of squared updates. No learning-rate
//! schedule is required, which suits a pipeline meant to run unattended.

use ndarray::{Array, Dimension, Zip};

use crate::gru::{GruCell, GruGrads};
use crate::seq2seq::{Seq2Seq, Seq2SeqGrads};

const RHO: f32 = 0.95;
const EPS: f32 = 1e-6;
const LR: f32 = 1.0;

/// Adadelta optimizer over a [`Seq2Seq`] weight set
pub struct Adadelta {
    state: Option<State>,
}

struct State {
    acc_grad: Seq2SeqGrads,
    acc_update: Seq2SeqGrads,
}

impl Adadelta {
    pub fn new() -> Self {
        Self { state: None }
    }

    /// Applies one update to every tensor in the model
    pub fn apply(&mut self, model: &mut Seq2Seq, grads: &Seq2SeqGrads) {
        let state = self.state.get_or_insert_with(|| State {
            acc_grad: Seq2SeqGrads::zeros_like(model),
            acc_update: Seq2SeqGrads::zeros_like(model),
        });

        apply_gru(
            &mut model.encoder,
            &grads.encoder,
            &mut state.acc_grad.encoder,
            &mut state.acc_update.encoder,
        );
        apply_gru(
            &mut model.decoder,
            &grads.decoder,
            &mut state.acc_grad.decoder,
            &mut state.acc_update.decoder,
        );
        update(
            &mut model.head.w,
            &grads.head.w,
            &mut state.acc_grad.head.w,
            &mut state.acc_update.head.w,
        );
        update(
            &mut model.head.b,
            &grads.head.b,
            &mut state.acc_grad.head.b,
            &mut state.acc_update.head.b,
        );
    }
}

impl Default for Adadelta {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_gru(cell: &mut GruCell, g: &GruGrads, ag: &mut GruGrads, au: &mut GruGrads) {
    update(&mut cell.wz, &g.wz, &mut ag.wz, &mut au.wz);
    update(&mut cell.uz, &g.uz, &mut ag.uz, &mut au.uz);
    update(&mut cell.bz, &g.bz, &mut ag.bz, &mut au.bz);
    update(&mut cell.wr, &g.wr, &mut ag.wr, &mut au.wr);
    update(&mut cell.ur, &g.ur, &mut ag.ur, &mut au.ur);
    update(&mut cell.br, &g.br, &mut ag.br, &mut au.br);
    update(&mut cell.wh, &g.wh, &mut ag.wh, &mut au.wh);
    update(&mut cell.uh, &g.uh, &mut ag.uh, &mut au.uh);
    update(&mut cell.bh, &g.bh, &mut ag.bh, &mut au.bh);
}

fn update<D: Dimension>(
    param: &mut Array<f32, D>,
    grad: &Array<f32, D>,
    acc_grad: &mut Array<f32, D>,
    acc_update: &mut Array<f32, D>,
) {
    Zip::from(param)
        .and(grad)
        .and(acc_grad)
        .and(acc_update)
        .for_each(|p, &g, ag, au| {
            *ag = RHO * *ag + (1.0 - RHO) * g * g;
            let delta = -((*au + EPS).sqrt() / (*ag + EPS).sqrt()) * g;
            *au = RHO * *au + (1.0 - RHO) * delta * delta;
            *p += LR * delta;
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    #[test]
    fn test_update_moves_against_gradient() {
        let mut p = Array1::from_elem(3, 1.0f32);
        let g = Array1::from_elem(3, 2.0f32);
        let mut ag = Array1::zeros(3);
        let mut au = Array1::zeros(3);
        update(&mut p, &g, &mut ag, &mut au);
        assert!(p.iter().all(|&v| v < 1.0), "positive gradient must shrink the parameter");
    }

    #[test]
    fn test_zero_gradient_is_a_noop() {
        let mut p = Array1::from_elem(3, 1.0f32);
        let g = Array1::zeros(3);
        let mut ag = Array1::zeros(3);
        let mut au = Array1::zeros(3);
        update(&mut p, &g, &mut ag, &mut au);
        assert_eq!(p, Array1::from_elem(3, 1.0f32));
    }
}
