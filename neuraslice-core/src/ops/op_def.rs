// neuraslice-core/src/ops/op_def.rs

//! Operator-definition boundary: a Slice described by names, built once and
//! run against a `Workspace` of named tensors.

use std::collections::HashMap;

use log::{debug, info};

use crate::device::StorageDevice;
use crate::error::NeuraSliceError;
use crate::ops::dispatch::SliceKernel;
use crate::tensor::Tensor;
use crate::types::DType;

/// Declarative description of one operator instance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OperatorDef {
    pub op_type: String,
    pub name: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub args: HashMap<String, i64>,
}

impl OperatorDef {
    pub fn int_arg(&self, name: &str) -> Option<i64> {
        self.args.get(name).copied()
    }
}

/// Builder for [`OperatorDef`].
///
/// ```
/// use neuraslice_core::ops::op_def::OpDefBuilder;
///
/// let def = OpDefBuilder::new("Slice", "SliceTest")
///     .input("Input")
///     .output("Output0")
///     .output("Output1")
///     .add_int_arg("T", 19)
///     .finalize();
/// assert_eq!(def.outputs.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct OpDefBuilder {
    def: OperatorDef,
}

impl OpDefBuilder {
    pub fn new(op_type: &str, name: &str) -> Self {
        OpDefBuilder {
            def: OperatorDef {
                op_type: op_type.to_string(),
                name: name.to_string(),
                ..OperatorDef::default()
            },
        }
    }

    pub fn input(mut self, name: &str) -> Self {
        self.def.inputs.push(name.to_string());
        self
    }

    pub fn output(mut self, name: &str) -> Self {
        self.def.outputs.push(name.to_string());
        self
    }

    pub fn add_int_arg(mut self, name: &str, value: i64) -> Self {
        self.def.args.insert(name.to_string(), value);
        self
    }

    pub fn finalize(self) -> OperatorDef {
        self.def
    }
}

/// Named tensors an operator reads from and writes to.
#[derive(Debug, Default)]
pub struct Workspace {
    tensors: HashMap<String, Tensor>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `tensor` under `name`, returning the tensor it replaces.
    pub fn insert(&mut self, name: &str, tensor: Tensor) -> Option<Tensor> {
        self.tensors.insert(name.to_string(), tensor)
    }

    pub fn get(&self, name: &str) -> Result<&Tensor, NeuraSliceError> {
        self.tensors
            .get(name)
            .ok_or_else(|| NeuraSliceError::TensorNotFound(name.to_string()))
    }

    pub fn remove(&mut self, name: &str) -> Result<Tensor, NeuraSliceError> {
        self.tensors
            .remove(name)
            .ok_or_else(|| NeuraSliceError::TensorNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tensors.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }
}

/// A validated Slice operator bound to a device.
#[derive(Debug, Clone)]
pub struct SliceOp {
    name: String,
    input: String,
    outputs: Vec<String>,
    kernel: SliceKernel,
}

impl SliceOp {
    pub const OP_TYPE: &'static str = "Slice";

    /// Validates `def` and selects the kernel for `device`.
    ///
    /// The `"T"` argument picks the image precision on GPU (F32 when absent);
    /// CPU always computes in F32 and ignores it.
    ///
    /// # Errors
    /// * `UnsupportedOperation` if `def.op_type` is not `"Slice"`.
    /// * `ArityMismatch` unless there is exactly one input and at least one output.
    /// * `InvalidArgument` for an unknown `"T"` code.
    pub fn from_def(def: &OperatorDef, device: StorageDevice) -> Result<Self, NeuraSliceError> {
        if def.op_type != Self::OP_TYPE {
            return Err(NeuraSliceError::UnsupportedOperation(format!(
                "operator '{}' has type '{}', expected '{}'",
                def.name,
                def.op_type,
                Self::OP_TYPE
            )));
        }
        if def.inputs.len() != 1 {
            return Err(NeuraSliceError::ArityMismatch {
                operator: def.name.clone(),
                kind: "inputs".to_string(),
                expected: "1".to_string(),
                actual: def.inputs.len(),
            });
        }
        if def.outputs.is_empty() {
            return Err(NeuraSliceError::ArityMismatch {
                operator: def.name.clone(),
                kind: "outputs".to_string(),
                expected: "at least 1".to_string(),
                actual: 0,
            });
        }
        let requested = match def.int_arg("T") {
            Some(code) => DType::from_arg_code(code).ok_or_else(|| NeuraSliceError::InvalidArgument {
                name: "T".to_string(),
                reason: format!("unknown dtype code {}", code),
            })?,
            None => DType::F32,
        };
        let dtype = match device {
            StorageDevice::CPU => DType::F32,
            StorageDevice::GPU => requested,
        };
        let kernel = SliceKernel::select(device, dtype)?;
        debug!("Built Slice operator '{}' with kernel {:?}", def.name, kernel);
        Ok(SliceOp {
            name: def.name.clone(),
            input: def.inputs[0].clone(),
            outputs: def.outputs.clone(),
            kernel,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kernel(&self) -> SliceKernel {
        self.kernel
    }

    /// Slices the named input and stores every output under its name.
    ///
    /// Nothing is written to the workspace unless all outputs were produced.
    pub fn run(&self, workspace: &mut Workspace) -> Result<(), NeuraSliceError> {
        let results = {
            let input = workspace.get(&self.input)?;
            self.kernel.run(input, self.outputs.len())?
        };
        for (name, tensor) in self.outputs.iter().zip(results) {
            workspace.insert(name, tensor);
        }
        info!("Slice '{}' wrote {} outputs", self.name, self.outputs.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::BufferType;
    use crate::tensor::randn_seeded;
    use crate::types::{DT_FLOAT, DT_HALF};
    use crate::utils::testing::check_slice_outputs;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn slice_def(num_outputs: usize, dtype_code: i64) -> OperatorDef {
        let mut builder = OpDefBuilder::new("Slice", "SliceTest").input("Input");
        for i in 0..num_outputs {
            builder = builder.output(&format!("Output{}", i));
        }
        builder.add_int_arg("T", dtype_code).finalize()
    }

    #[test]
    fn test_builder() {
        let def = slice_def(2, DT_HALF);
        assert_eq!(def.op_type, "Slice");
        assert_eq!(def.name, "SliceTest");
        assert_eq!(def.inputs, vec!["Input".to_string()]);
        assert_eq!(def.outputs, vec!["Output0".to_string(), "Output1".to_string()]);
        assert_eq!(def.int_arg("T"), Some(DT_HALF));
        assert_eq!(def.int_arg("missing"), None);
    }

    #[test]
    fn test_from_def_selects_kernel() {
        let op = SliceOp::from_def(&slice_def(2, DT_HALF), StorageDevice::GPU).unwrap();
        assert_eq!(op.kernel(), SliceKernel::GpuFloat16);
        let op = SliceOp::from_def(&slice_def(2, DT_FLOAT), StorageDevice::GPU).unwrap();
        assert_eq!(op.kernel(), SliceKernel::GpuFloat32);
        // CPU ignores T.
        let op = SliceOp::from_def(&slice_def(2, DT_HALF), StorageDevice::CPU).unwrap();
        assert_eq!(op.kernel(), SliceKernel::CpuFloat32);
        let no_t = OpDefBuilder::new("Slice", "NoT").input("Input").output("Out").finalize();
        assert_eq!(
            SliceOp::from_def(&no_t, StorageDevice::GPU).unwrap().kernel(),
            SliceKernel::GpuFloat32
        );
    }

    #[test]
    fn test_from_def_validation() {
        let wrong_type = OpDefBuilder::new("Concat", "C").input("a").output("b").finalize();
        assert!(matches!(
            SliceOp::from_def(&wrong_type, StorageDevice::CPU),
            Err(NeuraSliceError::UnsupportedOperation(_))
        ));

        let two_inputs = OpDefBuilder::new("Slice", "S").input("a").input("b").output("c").finalize();
        assert!(matches!(
            SliceOp::from_def(&two_inputs, StorageDevice::CPU),
            Err(NeuraSliceError::ArityMismatch { actual: 2, .. })
        ));

        let no_outputs = OpDefBuilder::new("Slice", "S").input("a").finalize();
        assert!(matches!(
            SliceOp::from_def(&no_outputs, StorageDevice::CPU),
            Err(NeuraSliceError::ArityMismatch { actual: 0, .. })
        ));

        assert!(matches!(
            SliceOp::from_def(&slice_def(2, 7), StorageDevice::GPU),
            Err(NeuraSliceError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_run_cpu() {
        let shape = [3, 4, 5, 8];
        let input = randn_seeded(&shape, &mut StdRng::seed_from_u64(21)).unwrap();
        let data = input.get_f32_data().unwrap();
        let mut ws = Workspace::new();
        ws.insert("Input", input);

        let op = SliceOp::from_def(&slice_def(2, DT_FLOAT), StorageDevice::CPU).unwrap();
        op.run(&mut ws).unwrap();
        assert_eq!(ws.len(), 3);
        let outputs = vec![ws.remove("Output0").unwrap(), ws.remove("Output1").unwrap()];
        check_slice_outputs(&data, &shape, &outputs, 0.0);
    }

    #[test]
    fn test_run_gpu_f16() {
        let shape = [2, 3, 4, 16];
        let input = randn_seeded(&shape, &mut StdRng::seed_from_u64(22)).unwrap();
        let data = input.get_f32_data().unwrap();
        let mut ws = Workspace::new();
        ws.insert("Input", input.to_image(BufferType::InOutChannel, DType::F16).unwrap());

        let op = SliceOp::from_def(&slice_def(4, DT_HALF), StorageDevice::GPU).unwrap();
        op.run(&mut ws).unwrap();
        let outputs: Vec<Tensor> = (0..4)
            .map(|i| {
                ws.get(&format!("Output{}", i))
                    .unwrap()
                    .to_buffer(BufferType::InOutChannel)
                    .unwrap()
            })
            .collect();
        check_slice_outputs(&data, &shape, &outputs, 1e-2);
    }

    #[test]
    fn test_run_failure_writes_nothing() {
        let mut ws = Workspace::new();
        ws.insert("Input", Tensor::new(vec![0.0; 10], vec![1, 1, 1, 10]).unwrap());
        let op = SliceOp::from_def(&slice_def(3, DT_FLOAT), StorageDevice::CPU).unwrap();
        assert!(matches!(
            op.run(&mut ws),
            Err(NeuraSliceError::IndivisibleChannels { channels: 10, num_outputs: 3 })
        ));
        assert_eq!(ws.len(), 1);
        assert!(!ws.contains("Output0"));
    }

    #[test]
    fn test_run_missing_input() {
        let mut ws = Workspace::new();
        let op = SliceOp::from_def(&slice_def(1, DT_FLOAT), StorageDevice::CPU).unwrap();
        assert_eq!(op.run(&mut ws), Err(NeuraSliceError::TensorNotFound("Input".to_string())));
    }
}
