//! Live synchronized views over observable collections.
//!
//! A source collection reports every mutation as a fine-grained
//! [`CollectionChange`]. Views derived from it keep a transformed mirror
//! that is updated incrementally inside the source's critical section, can
//! be filtered or kept in their own sort order, and report their own
//! changes as [`ViewChange`]s indexed by *visible* position.
//!
//!# Examples
//!
//! ```
//! use syncview::{buffer::ObservableList, projection::ViewExt};
//!
//! let source = ObservableList::with_data(vec![10, 50, 30, 20, 40]);
//! let view = source.create_view(|x| x.to_string());
//! view.attach_filter_fn(|x, _| x % 3 == 0);
//!
//! assert_eq!(view.len(), 1);
//!
//! source.set(0, 33).unwrap();   // enters the filter
//! source.push(7);               // stays hidden
//!
//! let visible: Vec<String> = view
//!     .snapshot()
//!     .unwrap()
//!     .into_iter()
//!     .map(|(_, v)| v)
//!     .collect();
//! assert_eq!(visible, vec!["33", "30"]);
//! ```

pub mod error;
pub mod view;
pub mod buffer;
pub mod projection;

pub use {
    error::{Error, Result},
    view::{CollectionChange, SyncRoot, ViewChange},
};
