mod verify_tests;
