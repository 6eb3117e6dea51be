use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

#[derive(Debug, Clone)]
pub struct NoiseField {
    perm: [u8; 256],
}

impl NoiseField {
    pub fn new(seed: u64) -> Self {
        let mut perm = [0u8; 256];
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = i as u8;
        }
        let mut rng = StdRng::seed_from_u64(seed);
        perm.shuffle(&mut rng);
        Self { perm }
    }

    // Smooth 2-D value noise in [0, 1], periodic every 256 units.
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;

        let xi = (x0 as i64).rem_euclid(256) as usize;
        let yi = (y0 as i64).rem_euclid(256) as usize;

        let v00 = self.lattice(xi, yi);
        let v10 = self.lattice(xi + 1, yi);
        let v01 = self.lattice(xi, yi + 1);
        let v11 = self.lattice(xi + 1, yi + 1);

        let u = smooth(fx);
        let v = smooth(fy);
        let near = lerp(v00, v10, u);
        let far = lerp(v01, v11, u);
        lerp(near, far, v)
    }

    fn lattice(&self, xi: usize, yi: usize) -> f32 {
        let hashed = self.perm[(usize::from(self.perm[xi & 255]) + (yi & 255)) & 255];
        f32::from(hashed) / 255.0
    }
}

fn smooth(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
