//! 修正中位切分（MMCQ）颜色量化
//!
//! 每个通道保留高 5 位建立直方图，先按像素数切分到目标数量的 75%，
//! 剩余部分按「像素数 × 体积」切分，避免大片相近色吞掉小块的高饱和色。

use domain::color::Rgb;

const SIGBITS: u32 = 5;
const RSHIFT: u32 = 8 - SIGBITS;
const SIDE: usize = 1 << SIGBITS;
const MAX_ITERATIONS: usize = 1000;
const FRACT_BY_POPULATION: f64 = 0.75;

/// 量化得到的代表色
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Swatch {
    pub rgb: Rgb,
    pub population: u32,
}

struct Histogram {
    counts: Vec<u32>,
}

impl Histogram {
    fn from_pixels(pixels: &[Rgb]) -> Self {
        let mut counts = vec![0u32; SIDE * SIDE * SIDE];
        for p in pixels {
            let cell = [
                (p.r >> RSHIFT) as usize,
                (p.g >> RSHIFT) as usize,
                (p.b >> RSHIFT) as usize,
            ];
            counts[Self::index(cell)] += 1;
        }
        Self { counts }
    }

    fn index(cell: [usize; 3]) -> usize {
        (cell[0] << (2 * SIGBITS)) | (cell[1] << SIGBITS) | cell[2]
    }

    fn count(&self, cell: [usize; 3]) -> u64 {
        u64::from(self.counts[Self::index(cell)])
    }

    fn for_each_cell(&self, min: [usize; 3], max: [usize; 3], mut f: impl FnMut([usize; 3], u64)) {
        for r in min[0]..=max[0] {
            for g in min[1]..=max[1] {
                for b in min[2]..=max[2] {
                    let n = self.count([r, g, b]);
                    if n > 0 {
                        f([r, g, b], n);
                    }
                }
            }
        }
    }

    fn population(&self, min: [usize; 3], max: [usize; 3]) -> u64 {
        let mut total = 0;
        self.for_each_cell(min, max, |_, n| total += n);
        total
    }
}

/// 直方图中的一个长方体区域，边界总是收缩到实际含有像素的范围
#[derive(Debug, Clone, Copy)]
struct VBox {
    min: [usize; 3],
    max: [usize; 3],
    population: u64,
}

impl VBox {
    fn fit(min: [usize; 3], max: [usize; 3], hist: &Histogram) -> Option<VBox> {
        let mut lo = [SIDE; 3];
        let mut hi = [0usize; 3];
        let mut population = 0;
        hist.for_each_cell(min, max, |cell, n| {
            population += n;
            for c in 0..3 {
                lo[c] = lo[c].min(cell[c]);
                hi[c] = hi[c].max(cell[c]);
            }
        });
        (population > 0).then_some(VBox {
            min: lo,
            max: hi,
            population,
        })
    }

    fn volume(&self) -> u64 {
        (0..3)
            .map(|c| (self.max[c] - self.min[c] + 1) as u64)
            .product()
    }

    /// 以格子中心为代表按像素数加权平均
    fn average(&self, hist: &Histogram) -> Rgb {
        let mult = f64::from(1u32 << RSHIFT);
        let mut sums = [0f64; 3];
        hist.for_each_cell(self.min, self.max, |cell, n| {
            for c in 0..3 {
                sums[c] += n as f64 * (cell[c] as f64 + 0.5) * mult;
            }
        });
        let channel = |c: usize| (sums[c] / self.population as f64).round().clamp(0.0, 255.0) as u8;
        Rgb::new(channel(0), channel(1), channel(2))
    }

    fn split(&self, hist: &Histogram) -> Option<(VBox, VBox)> {
        if self.volume() == 1 {
            return None;
        }

        // 沿最长的通道切，等长时依次优先 r、g、b
        let mut axis = 0;
        for c in 1..3 {
            if self.max[c] - self.min[c] > self.max[axis] - self.min[axis] {
                axis = c;
            }
        }
        let (lo, hi) = (self.min[axis], self.max[axis]);

        let mut partial = [0u64; SIDE];
        let mut total = 0;
        for i in lo..=hi {
            let (mut min, mut max) = (self.min, self.max);
            min[axis] = i;
            max[axis] = i;
            total += hist.population(min, max);
            partial[i] = total;
        }

        let median = (lo..=hi).find(|&i| partial[i] > total / 2)?;
        let left = median - lo;
        let right = hi - median;
        // 切点偏向较大的一侧
        let cut = if left <= right {
            (median + right / 2) as isize
        } else {
            median as isize - 1 - (left / 2) as isize
        };
        let cut = cut.clamp(lo as isize, hi as isize - 1) as usize;

        let mut first_max = self.max;
        first_max[axis] = cut;
        let mut second_min = self.min;
        second_min[axis] = cut + 1;

        Some((
            VBox::fit(self.min, first_max, hist)?,
            VBox::fit(second_min, self.max, hist)?,
        ))
    }
}

fn split_until(
    boxes: &mut Vec<VBox>,
    done: &mut Vec<VBox>,
    target: usize,
    hist: &Histogram,
    priority: impl Fn(&VBox) -> u64,
) {
    let mut iterations = 0;
    while boxes.len() + done.len() < target && iterations < MAX_ITERATIONS {
        iterations += 1;
        let Some(pos) = (0..boxes.len()).max_by_key(|&i| priority(&boxes[i])) else {
            break;
        };
        let vbox = boxes.swap_remove(pos);
        match vbox.split(hist) {
            Some((first, second)) => {
                boxes.push(first);
                boxes.push(second);
            }
            None => done.push(vbox),
        }
    }
}

/// 把像素量化为至多 `max_colors` 个代表色
pub fn quantize(pixels: &[Rgb], max_colors: usize) -> Vec<Swatch> {
    if pixels.is_empty() || max_colors == 0 {
        return Vec::new();
    }

    let hist = Histogram::from_pixels(pixels);
    let Some(root) = VBox::fit([0; 3], [SIDE - 1; 3], &hist) else {
        return Vec::new();
    };

    let mut boxes = vec![root];
    let mut done = Vec::new();
    let by_population = ((max_colors as f64) * FRACT_BY_POPULATION).ceil() as usize;
    split_until(&mut boxes, &mut done, by_population, &hist, |b| b.population);
    split_until(&mut boxes, &mut done, max_colors, &hist, |b| {
        b.population * b.volume()
    });

    boxes
        .into_iter()
        .chain(done)
        .map(|b| Swatch {
            rgb: b.average(&hist),
            population: b.population as u32,
        })
        .collect()
}
