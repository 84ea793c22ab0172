mod subscription_tests;
mod topic_tests;
