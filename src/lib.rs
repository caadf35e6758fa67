//! ASARdine: Envisat/ERS ASAR product decoding and radiometric calibration
//!
//! Reads the monolithic `.N1`/`.E1`/`.E2` product format, decodes the annotation
//! records needed for calibration and geolocation, and derives the per-sample
//! calibration vector from orbit geometry, antenna patterns and range spreading loss.

pub mod config;
pub mod core;
pub mod io;
pub mod types;

// Re-export main types and functions for easier access
pub use config::ReaderConfig;
pub use self::core::{build_calibration_vector, CalibrationVector, CalibrationVectorBuilder};
pub use io::{open_product, read_descriptor_table, AsarProduct, AsarReader, DatasetDescriptor, ProductAttributes};
pub use types::{AsarError, AsarResult, Mission, Polarization, SampleType};

#[cfg(feature = "python")]
mod python {
    use super::*;
    use numpy::{PyArray1, ToPyArray};
    use pyo3::exceptions::{PyIOError, PyRuntimeError, PyValueError};
    use pyo3::prelude::*;

    fn to_py_err(e: AsarError) -> PyErr {
        match e {
            AsarError::Io(_) => PyIOError::new_err(format!("{}", e)),
            AsarError::Config(_) => PyValueError::new_err(format!("{}", e)),
            _ => PyRuntimeError::new_err(format!("{}", e)),
        }
    }

    /// Python module definition
    #[pymodule]
    fn _core(_py: Python, m: &PyModule) -> PyResult<()> {
        m.add_class::<PyAsarReader>()?;
        m.add_class::<PyAsarProduct>()?;
        m.add_function(wrap_pyfunction!(open, m)?)?;
        Ok(())
    }

    /// Open a product with the default configuration
    #[pyfunction]
    fn open(path: String) -> PyResult<PyAsarProduct> {
        let product = open_product(&path).map_err(to_py_err)?;
        Ok(PyAsarProduct { inner: product })
    }

    /// Python wrapper for AsarReader
    #[pyclass(name = "AsarReader")]
    struct PyAsarReader {
        inner: AsarReader,
    }

    #[pymethods]
    impl PyAsarReader {
        #[new]
        #[pyo3(signature = (aux_root = None, apply_antenna_gain = true))]
        fn new(aux_root: Option<String>, apply_antenna_gain: bool) -> PyResult<Self> {
            let mut config = match aux_root {
                Some(root) => ReaderConfig::with_aux_root(root),
                None => ReaderConfig::default(),
            };
            config.apply_antenna_gain = apply_antenna_gain;
            let reader = AsarReader::new(config).map_err(to_py_err)?;
            Ok(PyAsarReader { inner: reader })
        }

        fn open(&self, path: String) -> PyResult<PyAsarProduct> {
            let product = self.inner.open(&path).map_err(to_py_err)?;
            Ok(PyAsarProduct { inner: product })
        }
    }

    /// Python wrapper for AsarProduct
    #[pyclass(name = "AsarProduct")]
    struct PyAsarProduct {
        inner: AsarProduct,
    }

    #[pymethods]
    impl PyAsarProduct {
        #[getter]
        fn product_name(&self) -> String {
            self.inner.attributes.product_name.clone()
        }

        #[getter]
        fn swath(&self) -> String {
            self.inner.attributes.swath.clone()
        }

        #[getter]
        fn polarization(&self) -> String {
            format!("{}", self.inner.attributes.polarization)
        }

        #[getter]
        fn slant_time_first(&self) -> Option<f64> {
            self.inner.slant_time_first()
        }

        #[getter]
        fn incidence_angle_centre(&self) -> Option<f64> {
            self.inner.incidence_angle_centre()
        }

        #[getter]
        fn calibration_factor(&self) -> f64 {
            self.inner.calibration_factor()
        }

        #[getter]
        fn reference_elevation_angle(&self) -> Option<f64> {
            self.inner.reference_elevation_angle()
        }

        #[getter]
        fn calibration_vector<'py>(&self, py: Python<'py>) -> &'py PyArray1<f64> {
            self.inner.calibration.factors.to_pyarray(py)
        }

        #[getter]
        fn slant_range_times<'py>(&self, py: Python<'py>) -> Option<&'py PyArray1<f64>> {
            self.inner.slant_range_times().map(|t| t.to_pyarray(py))
        }

        /// Zero-Doppler line times as RFC 3339 strings
        #[getter]
        fn azimuth_times(&self) -> Vec<String> {
            self.inner.azimuth_times().iter().map(|t| t.to_rfc3339()).collect()
        }

        /// (offset, size) of the calibrated measurement data set
        #[getter]
        fn measurement_segment(&self) -> Option<(u64, u64)> {
            self.inner.measurement.as_ref().map(|d| (d.offset, d.size))
        }

        fn __repr__(&self) -> String {
            format!(
                "AsarProduct('{}', swath={}, samples={})",
                self.inner.attributes.product_name,
                self.inner.attributes.swath,
                self.inner.calibration.len()
            )
        }
    }
}
