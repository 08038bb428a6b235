mod test_convergence;
mod test_from_yaml;
