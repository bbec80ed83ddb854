//! GRU cell with explicit forward caches and backward accumulation

use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Gated recurrent unit.
///
/// Update gate `z`, reset gate `r`, candidate `h~`:
///
/// ```text
/// z  = sigmoid(Wz x + Uz h + bz)
/// r  = sigmoid(Wr x + Ur h + br)
/// h~ = tanh(Wh x + Uh (r * h) + bh)
/// h' = z * h + (1 - z) * h~
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GruCell {
    pub wz: Array2<f32>,
    pub uz: Array2<f32>,
    pub bz: Array1<f32>,
    pub wr: Array2<f32>,
    pub ur: Array2<f32>,
    pub br: Array1<f32>,
    pub wh: Array2<f32>,
    pub uh: Array2<f32>,
    pub bh: Array1<f32>,
}

/// Forward activations of one timestep, kept for backprop
pub struct GruStepCache {
    pub x: Array1<f32>,
    pub h_prev: Array1<f32>,
    pub z: Array1<f32>,
    pub r: Array1<f32>,
    pub hh: Array1<f32>,
}

/// Gradient accumulator mirroring [`GruCell`]
#[derive(Debug, Clone)]
pub struct GruGrads {
    pub wz: Array2<f32>,
    pub uz: Array2<f32>,
    pub bz: Array1<f32>,
    pub wr: Array2<f32>,
    pub ur: Array2<f32>,
    pub br: Array1<f32>,
    pub wh: Array2<f32>,
    pub uh: Array2<f32>,
    pub bh: Array1<f32>,
}

pub(crate) fn glorot(rows: usize, cols: usize, rng: &mut impl Rng) -> Array2<f32> {
    let limit = (6.0 / (rows + cols) as f32).sqrt();
    Array2::from_shape_fn((rows, cols), |_| rng.gen_range(-limit..limit))
}

/// Outer product of two vectors
pub(crate) fn outer(a: &Array1<f32>, b: &Array1<f32>) -> Array2<f32> {
    let a2 = a.view().insert_axis(Axis(1));
    let b2 = b.view().insert_axis(Axis(0));
    a2.dot(&b2)
}

fn sigmoid(a: Array1<f32>) -> Array1<f32> {
    a.mapv(|v| 1.0 / (1.0 + (-v).exp()))
}

impl GruCell {
    pub fn new(input_dim: usize, hidden_dim: usize, rng: &mut impl Rng) -> Self {
        Self {
            wz: glorot(hidden_dim, input_dim, rng),
            uz: glorot(hidden_dim, hidden_dim, rng),
            bz: Array1::zeros(hidden_dim),
            wr: glorot(hidden_dim, input_dim, rng),
            ur: glorot(hidden_dim, hidden_dim, rng),
            br: Array1::zeros(hidden_dim),
            wh: glorot(hidden_dim, input_dim, rng),
            uh: glorot(hidden_dim, hidden_dim, rng),
            bh: Array1::zeros(hidden_dim),
        }
    }

    pub fn hidden_dim(&self) -> usize {
        self.bz.len()
    }

    pub fn input_dim(&self) -> usize {
        self.wz.ncols()
    }

    pub fn param_count(&self) -> usize {
        3 * (self.wz.len() + self.uz.len() + self.bz.len())
    }

    /// One forward timestep
    pub fn step(&self, x: ArrayView1<f32>, h_prev: ArrayView1<f32>) -> (Array1<f32>, GruStepCache) {
        let z = sigmoid(self.wz.dot(&x) + self.uz.dot(&h_prev) + &self.bz);
        let r = sigmoid(self.wr.dot(&x) + self.ur.dot(&h_prev) + &self.br);
        let rh = &r * &h_prev;
        let hh = (self.wh.dot(&x) + self.uh.dot(&rh) + &self.bh).mapv(f32::tanh);
        let one_minus_z = z.mapv(|v| 1.0 - v);
        let h_new = &z * &h_prev + &one_minus_z * &hh;

        let cache = GruStepCache {
            x: x.to_owned(),
            h_prev: h_prev.to_owned(),
            z,
            r,
            hh,
        };
        (h_new, cache)
    }

    /// One backward timestep.
    ///
    /// `dh` is the loss gradient with respect to this step's output
    /// state; parameter gradients accumulate into `grads` and the
    /// gradient with respect to the previous state is returned.
    pub fn backward_step(
        &self,
        cache: &GruStepCache,
        dh: &Array1<f32>,
        grads: &mut GruGrads,
    ) -> Array1<f32> {
        let one_minus_z = cache.z.mapv(|v| 1.0 - v);

        let dz = dh * &(&cache.h_prev - &cache.hh);
        let dhh = dh * &one_minus_z;
        let mut dh_prev = dh * &cache.z;

        // candidate pre-activation
        let da_h = &dhh * &cache.hh.mapv(|v| 1.0 - v * v);
        let rh = &cache.r * &cache.h_prev;
        grads.wh += &outer(&da_h, &cache.x);
        grads.uh += &outer(&da_h, &rh);
        grads.bh += &da_h;
        let drh = self.uh.t().dot(&da_h);
        let dr = &drh * &cache.h_prev;
        dh_prev = dh_prev + &drh * &cache.r;

        // update gate pre-activation
        let da_z = &dz * &(&cache.z * &one_minus_z);
        grads.wz += &outer(&da_z, &cache.x);
        grads.uz += &outer(&da_z, &cache.h_prev);
        grads.bz += &da_z;
        dh_prev = dh_prev + self.uz.t().dot(&da_z);

        // reset gate pre-activation
        let da_r = &dr * &(&cache.r * &cache.r.mapv(|v| 1.0 - v));
        grads.wr += &outer(&da_r, &cache.x);
        grads.ur += &outer(&da_r, &cache.h_prev);
        grads.br += &da_r;
        dh_prev = dh_prev + self.ur.t().dot(&da_r);

        dh_prev
    }
}

impl GruGrads {
    pub fn zeros(input_dim: usize, hidden_dim: usize) -> Self {
        Self {
            wz: Array2::zeros((hidden_dim, input_dim)),
            uz: Array2::zeros((hidden_dim, hidden_dim)),
            bz: Array1::zeros(hidden_dim),
            wr: Array2::zeros((hidden_dim, input_dim)),
            ur: Array2::zeros((hidden_dim, hidden_dim)),
            br: Array1::zeros(hidden_dim),
            wh: Array2::zeros((hidden_dim, input_dim)),
            uh: Array2::zeros((hidden_dim, hidden_dim)),
            bh: Array1::zeros(hidden_dim),
        }
    }

    pub fn scale(&mut self, k: f32) {
        self.wz *= k;
        self.uz *= k;
        self.bz *= k;
        self.wr *= k;
        self.ur *= k;
        self.br *= k;
        self.wh *= k;
        self.uh *= k;
        self.bh *= k;
    }
}
