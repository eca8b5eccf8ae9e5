//! # Tensor Operations Module (`ops`)
//!
//! Operations are grouped into submodules by what they do.
//!
//! ## Structure:
//!
//! - **`_op` Functions:** Each operation has a core function (named `xxx_op` or
//!   after its backend, e.g. `slice_cpu`) that validates its inputs and performs
//!   the computation. The `Tensor` methods (`to_image`, `to_buffer`,
//!   `slice_channels`) delegate to them.
//! - **Dispatch:** [`dispatch::SliceKernel`] maps an explicit `(device, dtype)`
//!   pair to one kernel. There is no implicit fallback between devices.
//!
//! ## Key Submodules:
//!
//! - [`transform`]: Buffer layout <-> Image layout conversion.
//! - [`slice`]: Channel-wise Slice, one kernel per backend.
//! - [`dispatch`]: Kernel selection.
//! - [`op_def`]: Operator definitions and the named-tensor workspace.

pub mod dispatch;
pub mod op_def;
pub mod slice;
pub mod transform;

pub use dispatch::{execute, SliceKernel};
pub use op_def::{OpDefBuilder, OperatorDef, SliceOp, Workspace};
