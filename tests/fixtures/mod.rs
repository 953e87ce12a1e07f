mod window_tests;
