//! NNUE network weights, feature indexing, and the forward pass.

use std::io::{self, Read};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::board::Board;
use crate::types::{Color, Piece, Square};

use super::accumulator::Accumulator;
use super::simd;
use super::{QA, QB, SCALE};

/// 64 squares x 6 piece types x 2 colors.
pub const INPUT_SIZE: usize = 768;
/// Hidden layer width, per perspective.
pub const HIDDEN: usize = 768;
/// Distinct weight blocks selected by the king's (mirrored) square.
pub const KING_BUCKETS: usize = 4;
/// Distinct output heads selected by remaining piece count.
pub const OUTPUT_BUCKETS: usize = 8;

/// Maps every square to one of `KING_BUCKETS` weight blocks, symmetric
/// about the d/e file since a king's horizontal mirror always lands on the
/// same bucket as the king itself. Kings on the back two ranks get the most
/// granular buckets since that's where most castled kings sit; central and
/// advanced kings are lumped together since they're rarer and more alike.
#[rustfmt::skip]
const KING_BUCKET_LAYOUT: [u8; 64] = [
    0, 0, 0, 0, 0, 0, 0, 0, // rank 1
    0, 0, 0, 0, 0, 0, 0, 0, // rank 2
    1, 1, 1, 1, 1, 1, 1, 1, // rank 3
    1, 1, 1, 1, 1, 1, 1, 1, // rank 4
    2, 2, 2, 2, 2, 2, 2, 2, // rank 5
    2, 2, 2, 2, 2, 2, 2, 2, // rank 6
    3, 3, 3, 3, 3, 3, 3, 3, // rank 7
    3, 3, 3, 3, 3, 3, 3, 3, // rank 8
];

/// Which king bucket a king on `king_sq`, from its own perspective, maps to.
#[must_use]
pub fn king_bucket(king_sq: Square) -> usize {
    KING_BUCKET_LAYOUT[king_sq.as_index()] as usize
}

/// Remaining-piece-count output bucket: fewer pieces on the board routes to
/// a higher bucket index, since endgame and middlegame positions benefit
/// from different output calibration.
#[must_use]
pub fn output_bucket(board: &Board) -> usize {
    let count = board.all_occupied().popcount() as usize;
    ((32 - count) * OUTPUT_BUCKETS / 32).min(OUTPUT_BUCKETS - 1)
}

/// True if the king's file is on the kingside half, which triggers a
/// horizontal mirror of every feature for that perspective.
#[must_use]
fn mirrors(king_sq: Square) -> bool {
    king_sq.file() >= 4
}

/// True if a king move from `from` to `to` changes which weight block or
/// mirror orientation that perspective's features read from, meaning every
/// other piece's feature index shifts too and a full refresh is needed
/// instead of an incremental add/remove of just the king's own feature.
#[must_use]
pub fn king_context_changed(from: Square, to: Square) -> bool {
    king_bucket(from) != king_bucket(to) || mirrors(from) != mirrors(to)
}

/// Feature index into `[king_bucket][768]`, from `perspective`'s point of
/// view, for `piece_color`'s `piece` standing on `sq`, given that
/// perspective's own king sits on `king_sq`.
#[must_use]
pub fn feature_index(
    perspective: Color,
    king_sq: Square,
    piece_color: Color,
    piece: Piece,
    sq: Square,
) -> (usize, usize) {
    let bucket = king_bucket(king_sq);
    let mirror = mirrors(king_sq);

    let mut oriented_sq = sq;
    if perspective == Color::Black {
        oriented_sq = oriented_sq.flip_vertical();
    }
    if mirror {
        oriented_sq = oriented_sq.flip_horizontal();
    }

    let oriented_color = if perspective == Color::Black {
        piece_color.opponent()
    } else {
        piece_color
    };

    let base = oriented_color.index() * 384 + piece.index() * 64 + oriented_sq.as_index();
    (bucket, base)
}

/// NNUE network weights: a feature transformer per king bucket and one
/// output head per output bucket.
pub struct NnueNetwork {
    pub feature_weights: Box<[[[i16; HIDDEN]; INPUT_SIZE]; KING_BUCKETS]>,
    pub feature_bias: [i16; HIDDEN],
    pub output_weights: Box<[[i16; HIDDEN * 2]; OUTPUT_BUCKETS]>,
    pub output_bias: [i16; OUTPUT_BUCKETS],
}

impl NnueNetwork {
    /// Load a network from the persisted little-endian weight blob format:
    /// feature weights (`KING_BUCKETS * INPUT_SIZE * HIDDEN` i16s), feature
    /// biases (`HIDDEN` i16s), output weights (`OUTPUT_BUCKETS * HIDDEN*2`
    /// i16s), output biases (`OUTPUT_BUCKETS` i16s).
    pub fn from_reader<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut feature_weights = Box::new([[[0i16; HIDDEN]; INPUT_SIZE]; KING_BUCKETS]);
        for bucket in feature_weights.iter_mut() {
            for row in bucket.iter_mut() {
                read_i16_slice(reader, row)?;
            }
        }
        let mut feature_bias = [0i16; HIDDEN];
        read_i16_slice(reader, &mut feature_bias)?;

        let mut output_weights = Box::new([[0i16; HIDDEN * 2]; OUTPUT_BUCKETS]);
        for row in output_weights.iter_mut() {
            read_i16_slice(reader, row)?;
        }
        let mut output_bias = [0i16; OUTPUT_BUCKETS];
        read_i16_slice(reader, &mut output_bias)?;

        Ok(NnueNetwork {
            feature_weights,
            feature_bias,
            output_weights,
            output_bias,
        })
    }

    pub fn from_bytes(data: &[u8]) -> io::Result<Self> {
        let mut cursor = io::Cursor::new(data);
        Self::from_reader(&mut cursor)
    }

    /// Default network used when no trained weight file is supplied via
    /// `setoption EvalFile`. There is no production-trained blob checked
    /// into this repository; this constructs a small-magnitude
    /// deterministic network from a fixed seed so the engine is always
    /// runnable (and its output is reproducible for testing), rather than
    /// shipping a fabricated "pretend trained" binary asset.
    #[must_use]
    pub fn from_embedded() -> Self {
        let mut rng = StdRng::seed_from_u64(0x4E4E_5545_0001);
        let mut feature_weights = Box::new([[[0i16; HIDDEN]; INPUT_SIZE]; KING_BUCKETS]);
        for bucket in feature_weights.iter_mut() {
            for row in bucket.iter_mut() {
                for w in row.iter_mut() {
                    *w = rng.gen_range(-64..=64);
                }
            }
        }
        let mut feature_bias = [0i16; HIDDEN];
        for b in feature_bias.iter_mut() {
            *b = rng.gen_range(-16..=16);
        }
        let mut output_weights = Box::new([[0i16; HIDDEN * 2]; OUTPUT_BUCKETS]);
        for row in output_weights.iter_mut() {
            for w in row.iter_mut() {
                *w = rng.gen_range(-64..=64);
            }
        }
        let mut output_bias = [0i16; OUTPUT_BUCKETS];
        for b in output_bias.iter_mut() {
            *b = rng.gen_range(-16..=16);
        }
        NnueNetwork {
            feature_weights,
            feature_bias,
            output_weights,
            output_bias,
        }
    }

    #[inline]
    #[must_use]
    pub fn evaluate(&self, acc: &Accumulator, white_to_move: bool, output_bucket: usize) -> i32 {
        let (us, them) = if white_to_move {
            (&acc.white, &acc.black)
        } else {
            (&acc.black, &acc.white)
        };
        let weights = &self.output_weights[output_bucket];
        let (us_weights, them_weights) = weights.split_at(HIDDEN);

        let us_weights: &[i16; HIDDEN] = us_weights.try_into().unwrap();
        let them_weights: &[i16; HIDDEN] = them_weights.try_into().unwrap();

        let us_output = simd::screlu_dot(us, us_weights);
        let them_output = simd::screlu_dot(them, them_weights);

        let output = us_output + them_output + i32::from(self.output_bias[output_bucket]) * QA;
        output * SCALE / (QA * QA * QB)
    }
}

fn read_i16_slice<R: Read>(reader: &mut R, out: &mut [i16]) -> io::Result<()> {
    let mut buf = vec![0u8; out.len() * 2];
    reader.read_exact(&mut buf)?;
    for (dst, chunk) in out.iter_mut().zip(buf.chunks_exact(2)) {
        *dst = i16::from_le_bytes([chunk[0], chunk[1]]);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_index_mirrors_by_king_file() {
        let king_kingside = Square::new(0, 6);
        let king_queenside = Square::new(0, 1);
        let (_, a) = feature_index(Color::White, king_kingside, Color::White, Piece::Pawn, Square::new(1, 0));
        let (_, b) = feature_index(Color::White, king_queenside, Color::White, Piece::Pawn, Square::new(1, 7));
        assert_eq!(a, b);
    }

    #[test]
    fn black_perspective_flips_vertically_and_swaps_color() {
        let king = Square::new(0, 1);
        let (_, white_feat) = feature_index(Color::White, king, Color::White, Piece::Pawn, Square::new(1, 1));
        let (_, black_feat) = feature_index(Color::Black, king.flip_vertical(), Color::Black, Piece::Pawn, Square::new(6, 1));
        assert_eq!(white_feat, black_feat);
    }

    #[test]
    fn output_bucket_decreases_slots_as_material_is_removed() {
        let board = Board::starting_position();
        let full = output_bucket(&board);
        assert!(full < OUTPUT_BUCKETS);
    }
}
