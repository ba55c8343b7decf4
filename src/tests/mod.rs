pub mod test_tabular;
