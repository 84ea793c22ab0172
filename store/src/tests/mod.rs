mod init_tests;
mod mem_store_tests;
