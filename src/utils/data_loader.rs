//! Example loading and splitting

use crate::error::{Result, ValidatorError};
use crate::training::check_binary_labels;
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

/// How a delimited examples file is laid out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderOptions {
    /// Field delimiter
    pub delimiter: u8,
    /// Lines to skip before the header (or before data when there is no header)
    pub skip_rows: usize,
    /// Whether a column-name row precedes the data
    pub has_header: bool,
}

impl Default for LoaderOptions {
    /// Two metadata lines, then the column names, then the data.
    fn default() -> Self {
        Self {
            delimiter: b',',
            skip_rows: 2,
            has_header: true,
        }
    }
}

/// Data loader for delimited example files.
///
/// Every column but the last is a feature; the last column is the label.
pub struct DataLoader {
    options: LoaderOptions,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new(LoaderOptions::default())
    }
}

impl DataLoader {
    /// Create a new data loader
    pub fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Load a delimited file into a DataFrame
    pub fn load_csv(&self, path: &Path) -> Result<DataFrame> {
        let file = File::open(path)
            .map_err(|e| ValidatorError::DataError(format!("{}: {}", path.display(), e)))?;

        let parse_opts = CsvParseOptions::default().with_separator(self.options.delimiter);

        let reader = CsvReadOptions::default()
            .with_has_header(self.options.has_header)
            .with_skip_rows(self.options.skip_rows)
            .with_infer_schema_length(Some(100))
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file);

        reader
            .finish()
            .map_err(|e| ValidatorError::DataError(e.to_string()))
    }

    /// Load examples: features from all columns but the last, labels from the last
    pub fn load_examples(&self, path: &Path) -> Result<ExampleSet> {
        let start = Instant::now();
        let df = self.load_csv(path)?;
        let examples = ExampleSet::from_dataframe(&df)?;
        debug!(
            path = %path.display(),
            rows = examples.n_examples(),
            features = examples.n_features(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Examples loaded"
        );
        Ok(examples)
    }
}

/// Feature matrix paired with binary labels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExampleSet {
    x: Array2<f64>,
    y: Array1<f64>,
}

/// One random train/test partition of an [`ExampleSet`]
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
}

impl ExampleSet {
    /// Build an example set, checking row counts and label values
    pub fn new(x: Array2<f64>, y: Array1<f64>) -> Result<Self> {
        if x.nrows() != y.len() {
            return Err(ValidatorError::ShapeError {
                expected: format!("{} labels", x.nrows()),
                actual: format!("{} labels", y.len()),
            });
        }
        if x.nrows() == 0 {
            return Err(ValidatorError::DataError("no examples provided".to_string()));
        }
        if x.ncols() == 0 {
            return Err(ValidatorError::DataError("examples have no features".to_string()));
        }
        check_binary_labels(&y).map_err(|e| ValidatorError::DataError(e.to_string()))?;
        Ok(Self { x, y })
    }

    /// Convert a DataFrame whose last column holds the labels
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let n_rows = df.height();
        let columns = df.get_columns();
        if columns.len() < 2 {
            return Err(ValidatorError::DataError(format!(
                "expected at least one feature column and a label column, found {} column(s)",
                columns.len()
            )));
        }

        let mut values: Vec<Vec<f64>> = Vec::with_capacity(columns.len());
        for column in columns {
            let series = column.as_materialized_series().cast(&DataType::Float64)?;
            let ca = series.f64()?;
            let col: Vec<f64> = ca
                .into_iter()
                .enumerate()
                .map(|(row, v)| {
                    v.ok_or_else(|| {
                        ValidatorError::DataError(format!(
                            "missing or non-numeric value in column '{}' at row {}",
                            series.name(),
                            row
                        ))
                    })
                })
                .collect::<Result<_>>()?;
            values.push(col);
        }

        let labels = values.pop().map(Array1::from_vec).unwrap_or_default();
        let n_features = values.len();
        let x = Array2::from_shape_fn((n_rows, n_features), |(i, j)| values[j][i]);

        Self::new(x, labels)
    }

    pub fn x(&self) -> &Array2<f64> {
        &self.x
    }

    pub fn y(&self) -> &Array1<f64> {
        &self.y
    }

    pub fn n_examples(&self) -> usize {
        self.y.len()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    /// Replace the features, e.g. after rescaling
    pub fn with_features(self, x: Array2<f64>) -> Result<Self> {
        Self::new(x, self.y)
    }

    /// `[positives, negatives]`
    pub fn class_counts(&self) -> [usize; 2] {
        let positives = self.y.iter().filter(|&&v| v == 1.0).count();
        [positives, self.y.len() - positives]
    }

    /// Rows at `indices`, in that order
    pub fn subset(&self, indices: &[usize]) -> (Array2<f64>, Array1<f64>) {
        (self.x.select(Axis(0), indices), self.y.select(Axis(0), indices))
    }

    /// Draw a random split holding out roughly `test_size` of every class.
    ///
    /// Each class with at least two examples contributes at least one example
    /// to each side, so both subsets see both labels whenever the data allows.
    pub fn train_test_split<R: Rng + ?Sized>(
        &self,
        test_size: f64,
        rng: &mut R,
    ) -> Result<TrainTestSplit> {
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(ValidatorError::InvalidParameter {
                name: "test_size".to_string(),
                value: test_size.to_string(),
                reason: "must be within (0, 1)".to_string(),
            });
        }

        let mut by_class: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (idx, &label) in self.y.iter().enumerate() {
            by_class.entry(label as i64).or_default().push(idx);
        }

        let mut train = Vec::with_capacity(self.y.len());
        let mut test = Vec::new();
        for indices in by_class.values_mut() {
            indices.shuffle(rng);
            let n = indices.len();
            let n_test = if n < 2 {
                0
            } else {
                ((n as f64 * test_size).round() as usize).clamp(1, n - 1)
            };
            test.extend_from_slice(&indices[..n_test]);
            train.extend_from_slice(&indices[n_test..]);
        }

        if test.is_empty() {
            return Err(ValidatorError::DataError(
                "not enough examples to hold out a test set".to_string(),
            ));
        }

        train.shuffle(rng);
        test.shuffle(rng);

        let (x_train, y_train) = self.subset(&train);
        let (x_test, y_test) = self.subset(&test);
        Ok(TrainTestSplit {
            x_train,
            x_test,
            y_train,
            y_test,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::io::Write;

    fn examples(n: usize) -> ExampleSet {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| (i * 2 + j) as f64);
        let y = Array1::from_shape_fn(n, |i| if i % 4 == 0 { 1.0 } else { 0.0 });
        ExampleSet::new(x, y).unwrap()
    }

    #[test]
    fn test_rejects_non_binary_labels() {
        let result = ExampleSet::new(array![[1.0], [2.0]], array![0.0, 3.0]);
        assert!(matches!(result, Err(ValidatorError::DataError(_))));
    }

    #[test]
    fn test_rejects_row_mismatch() {
        let result = ExampleSet::new(array![[1.0], [2.0]], array![0.0]);
        assert!(matches!(result, Err(ValidatorError::ShapeError { .. })));
    }

    #[test]
    fn test_class_counts() {
        assert_eq!(examples(20).class_counts(), [5, 15]);
    }

    #[test]
    fn test_split_is_stratified_and_disjoint() {
        let set = examples(100);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let split = set.train_test_split(0.2, &mut rng).unwrap();

        assert_eq!(split.x_test.nrows(), 20);
        assert_eq!(split.x_train.nrows(), 80);
        assert_eq!(split.y_test.iter().filter(|&&v| v == 1.0).count(), 5);

        // Feature column 0 is unique per row, so it identifies examples
        let mut seen: Vec<f64> = split
            .x_train
            .column(0)
            .iter()
            .chain(split.x_test.column(0).iter())
            .copied()
            .collect();
        seen.sort_by(|a, b| a.total_cmp(b));
        seen.dedup();
        assert_eq!(seen.len(), 100);
    }

    #[test]
    fn test_small_split_keeps_both_classes() {
        let set = examples(8);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let split = set.train_test_split(0.2, &mut rng).unwrap();
        assert!(split.y_test.iter().any(|&v| v == 1.0));
        assert!(split.y_test.iter().any(|&v| v == 0.0));
        assert!(split.y_train.iter().any(|&v| v == 1.0));
    }

    #[test]
    fn test_invalid_test_size() {
        let set = examples(10);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(set.train_test_split(1.0, &mut rng).is_err());
    }

    #[test]
    fn test_load_examples_with_metadata_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("examples.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "nfeatures,targetclasses,targettype").unwrap();
        writeln!(file, "2,\"[0,1]\",discrete").unwrap();
        writeln!(file, "f1,f2,target").unwrap();
        writeln!(file, "0.5,1.0,0").unwrap();
        writeln!(file, "1.5,2.0,1").unwrap();
        writeln!(file, "2.5,3.0,1").unwrap();
        drop(file);

        let set = DataLoader::default().load_examples(&path).unwrap();
        assert_eq!(set.n_examples(), 3);
        assert_eq!(set.n_features(), 2);
        assert_eq!(set.y(), &array![0.0, 1.0, 1.0]);
        assert_eq!(set.x()[[2, 1]], 3.0);
    }

    #[test]
    fn test_load_plain_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.csv");
        std::fs::write(&path, "a;b\n1;0\n2;1\n").unwrap();

        let loader = DataLoader::new(LoaderOptions {
            delimiter: b';',
            skip_rows: 0,
            has_header: true,
        });
        let set = loader.load_examples(&path).unwrap();
        assert_eq!(set.n_features(), 1);
        assert_eq!(set.class_counts(), [1, 1]);
    }

    #[test]
    fn test_missing_file() {
        let result = DataLoader::default().load_examples(Path::new("/nonexistent/examples.csv"));
        assert!(matches!(result, Err(ValidatorError::DataError(_))));
    }
}
