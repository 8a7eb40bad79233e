
                    /*\
<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                  Buffers
<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                    \*/

//! Storage and observable sources.
//!
//! [`RingBuffer`], [`AlternateIndexList`] and [`RankedTree`] are plain
//! containers used as view mirrors. [`ObservableList`] and
//! [`ObservableDeque`] are sources that report every mutation as a
//! [`CollectionChange`](crate::view::CollectionChange).

pub mod alternate_index;
pub mod deque;
pub mod ranked;
pub mod ring;
pub mod vec;

pub use {
    alternate_index::AlternateIndexList,
    deque::ObservableDeque,
    ranked::{NodeId, RankedTree},
    ring::RingBuffer,
    vec::ObservableList,
};
