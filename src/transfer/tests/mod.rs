mod test_coupling_basic;
